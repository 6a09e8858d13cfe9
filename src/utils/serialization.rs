// Hex helpers for the JSON projection of blocks and transactions.
// Binary fields travel as lowercase hex strings and must decode to their exact width.
use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER_PERMISSIVE;

pub fn hex_encode(bytes: &[u8]) -> String {
    data_encoding::HEXLOWER.encode(bytes)
}

/// Decode a hex string into exactly `N` bytes
pub fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes = HEXLOWER_PERMISSIVE
        .decode(value.as_bytes())
        .map_err(|e| LedgerError::Encoding(format!("{field} is not valid hex: {e}")))?;
    if bytes.len() != N {
        return Err(LedgerError::Encoding(format!(
            "{field} must be {N} bytes, got {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// `#[serde(with = "hex_bytes")]` for fixed-width byte arrays
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::hex_encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let value = String::deserialize(deserializer)?;
        super::decode_fixed::<N>("field", &value).map_err(serde::de::Error::custom)
    }
}

/// Same as [`hex_bytes`] for optional fields; absent maps to `null`
pub mod hex_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &Option<[u8; N]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&super::hex_encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<Option<[u8; N]>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|v| super::decode_fixed::<N>("field", &v))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Keyed {
        #[serde(with = "hex_bytes")]
        key: [u8; 4],
        #[serde(with = "hex_bytes_opt", default)]
        tag: Option<[u8; 2]>,
    }

    #[test]
    fn test_decode_fixed_checks_width() {
        assert_eq!(decode_fixed::<2>("f", "abcd").unwrap(), [0xab, 0xcd]);
        assert_eq!(decode_fixed::<2>("f", "ABCD").unwrap(), [0xab, 0xcd]);
        assert!(matches!(
            decode_fixed::<3>("f", "abcd"),
            Err(LedgerError::Encoding(_))
        ));
        assert!(decode_fixed::<2>("f", "zz00").is_err());
    }

    #[test]
    fn test_serde_helpers_render_hex() {
        let keyed = Keyed {
            key: [0xde, 0xad, 0xbe, 0xef],
            tag: None,
        };
        let json = serde_json::to_string(&keyed).unwrap();
        assert_eq!(json, r#"{"key":"deadbeef","tag":null}"#);

        let parsed: Keyed = serde_json::from_str(r#"{"key":"deadbeef","tag":"0102"}"#).unwrap();
        assert_eq!(parsed.tag, Some([1, 2]));
    }

    #[test]
    fn test_serde_rejects_wrong_width() {
        let parsed: std::result::Result<Keyed, _> = serde_json::from_str(r#"{"key":"dead"}"#);
        assert!(parsed.is_err());
    }
}
