//! Consensus constants and unit conversions
//!
//! Amounts, fees and balances are integers in the smallest unit. One coin
//! is 100,000,000 units.

/// Number of smallest units in one coin
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Block format version written into every block pre-image
pub const BLOCK_VERSION: u32 = 0;

/// Base target of the genesis block
pub const INITIAL_BASE_TARGET: u64 = 153_722_867;

/// Upper clamp for retargeting
pub const MAX_BASE_TARGET: u64 = INITIAL_BASE_TARGET * 1_000_000_000;

/// Seconds the retarget steers toward
pub const BLOCK_INTERVAL_SECONDS: u64 = 60;

/// Well-known id of the genesis block
pub const GENESIS_BLOCK_ID: &str = "10910396031294105665";

/// Trailing marker of plain account identifiers
pub const ACCOUNT_SUFFIX: char = 'C';

/// Trailing marker of identifiers that name an alias/address record
pub const ALIAS_SUFFIX: char = 'D';

/// Utility functions for monetary conversions
pub mod conversions {
    use super::*;

    /// Convert coins to units
    ///
    /// # Examples
    /// ```
    /// use stake_ledger::core::monetary::conversions::coins_to_units;
    /// assert_eq!(coins_to_units(1.0), 100_000_000);
    /// assert_eq!(coins_to_units(0.5), 50_000_000);
    /// ```
    pub fn coins_to_units(coins: f64) -> u64 {
        (coins * UNITS_PER_COIN as f64) as u64
    }

    /// Format a signed balance as a human-readable string
    ///
    /// # Examples
    /// ```
    /// use stake_ledger::core::monetary::conversions::format_units;
    /// assert_eq!(format_units(100_000_000), "1.00000000 coins");
    /// assert_eq!(format_units(-50_000_000), "-0.50000000 coins");
    /// ```
    pub fn format_units(units: i64) -> String {
        let sign = if units < 0 { "-" } else { "" };
        let abs = units.unsigned_abs();
        format!(
            "{sign}{}.{:08} coins",
            abs / UNITS_PER_COIN,
            abs % UNITS_PER_COIN
        )
    }
}

#[cfg(test)]
mod tests {
    use super::conversions::*;
    use super::*;

    #[test]
    fn test_consensus_constants() {
        assert_eq!(MAX_BASE_TARGET, 153_722_867_000_000_000);
        assert!(MAX_BASE_TARGET < i64::MAX as u64);
        assert!(GENESIS_BLOCK_ID.parse::<u64>().is_ok());
        const _: () = assert!(INITIAL_BASE_TARGET < MAX_BASE_TARGET);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(coins_to_units(1.0), UNITS_PER_COIN);
        assert_eq!(coins_to_units(2.5), UNITS_PER_COIN * 2 + UNITS_PER_COIN / 2);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_units(UNITS_PER_COIN as i64), "1.00000000 coins");
        assert_eq!(format_units(1_000), "0.00001000 coins");
        assert_eq!(format_units(0), "0.00000000 coins");
        assert_eq!(format_units(-1), "-0.00000001 coins");
    }
}
