use crate::core::monetary::{
    ACCOUNT_SUFFIX, ALIAS_SUFFIX, BLOCK_INTERVAL_SECONDS, GENESIS_BLOCK_ID, INITIAL_BASE_TARGET,
    MAX_BASE_TARGET,
};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const GENESIS_BLOCK_ID_KEY: &str = "LEDGER_GENESIS_BLOCK_ID";
const INITIAL_BASE_TARGET_KEY: &str = "LEDGER_INITIAL_BASE_TARGET";
const MAX_BASE_TARGET_KEY: &str = "LEDGER_MAX_BASE_TARGET";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub genesis_block_id: String,
    pub initial_base_target: u64,
    pub max_base_target: u64,
    /// Target seconds between blocks
    pub block_interval: u64,
    pub account_suffix: char,
    pub alias_suffix: char,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            genesis_block_id: String::from(GENESIS_BLOCK_ID),
            initial_base_target: INITIAL_BASE_TARGET,
            max_base_target: MAX_BASE_TARGET,
            block_interval: BLOCK_INTERVAL_SECONDS,
            account_suffix: ACCOUNT_SUFFIX,
            alias_suffix: ALIAS_SUFFIX,
        }
    }
}

impl ChainConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<ChainConfig> {
        let config: ChainConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ChainConfig> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            LedgerError::Config(format!(
                "Failed to read config {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Environment variables win over file and default values
    pub fn with_env_overrides(mut self) -> Result<ChainConfig> {
        if let Ok(id) = env::var(GENESIS_BLOCK_ID_KEY) {
            self.genesis_block_id = id;
        }
        if let Ok(value) = env::var(INITIAL_BASE_TARGET_KEY) {
            self.initial_base_target = parse_env_u64(INITIAL_BASE_TARGET_KEY, &value)?;
        }
        if let Ok(value) = env::var(MAX_BASE_TARGET_KEY) {
            self.max_base_target = parse_env_u64(MAX_BASE_TARGET_KEY, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.genesis_block_id.parse::<u64>().is_err() {
            return Err(LedgerError::Config(format!(
                "genesis_block_id must be an unsigned 64-bit decimal, got {}",
                self.genesis_block_id
            )));
        }
        if self.initial_base_target == 0 {
            return Err(LedgerError::Config(
                "initial_base_target must be positive".to_string(),
            ));
        }
        if self.initial_base_target > self.max_base_target {
            return Err(LedgerError::Config(format!(
                "initial_base_target {} exceeds max_base_target {}",
                self.initial_base_target, self.max_base_target
            )));
        }
        if self.block_interval == 0 {
            return Err(LedgerError::Config(
                "block_interval must be positive".to_string(),
            ));
        }
        if self.account_suffix == self.alias_suffix {
            return Err(LedgerError::Config(
                "account_suffix and alias_suffix must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|e| LedgerError::Config(format!("{key} is not a valid integer: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ChainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_base_target, 153_722_867);
        assert_eq!(config.max_base_target, 153_722_867 * 1_000_000_000);
        assert_eq!(config.block_interval, 60);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ChainConfig::from_toml_str("initial_base_target = 1000\n").unwrap();
        assert_eq!(config.initial_base_target, 1000);
        assert_eq!(config.genesis_block_id, GENESIS_BLOCK_ID);
        assert_eq!(config.alias_suffix, 'D');
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let result = ChainConfig::from_toml_str("initial_base_target = 10\nmax_base_target = 5\n");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_rejects_non_numeric_genesis_id() {
        let result = ChainConfig::from_toml_str("genesis_block_id = \"genesis\"\n");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "genesis_block_id = \"42\"").unwrap();
        writeln!(file, "block_interval = 10").unwrap();

        let config = ChainConfig::load(file.path()).unwrap();
        assert_eq!(config.genesis_block_id, "42");
        assert_eq!(config.block_interval, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChainConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }
}
