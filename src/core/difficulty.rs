use crate::config::ChainConfig;
use crate::error::{LedgerError, Result};
use log::debug;
use num_bigint::{BigInt, Sign};

/// Base-target retargeting and cumulative difficulty accounting
pub struct DifficultyAdjustment;

impl DifficultyAdjustment {
    pub fn initial_base_target(config: &ChainConfig) -> BigInt {
        BigInt::from(config.initial_base_target)
    }

    /// Retarget from the predecessor's base target and the seconds between
    /// the predecessor and the chain tip.
    pub fn next_base_target(
        previous_base_target: &BigInt,
        elapsed: i64,
        config: &ChainConfig,
    ) -> BigInt {
        let max = BigInt::from(config.max_base_target);
        let interval = BigInt::from(config.block_interval);

        let mut next = previous_base_target * BigInt::from(elapsed) / interval;

        if next.sign() == Sign::Minus || next > max {
            next = max.clone();
        }

        let half = previous_base_target / 2u32;
        if &next * 2u32 < *previous_base_target {
            next = half;
        }

        if next.sign() == Sign::NoSign {
            next = BigInt::from(1);
        }

        // The doubled ceiling falls back to the max when it leaves signed 64-bit range
        let mut doubled = previous_base_target * 2u32;
        if doubled.sign() == Sign::Minus || doubled.bits() > 63 {
            doubled = max;
        }
        if next > doubled {
            next = doubled;
        }

        debug!("Retarget: previous {previous_base_target}, elapsed {elapsed}s -> {next}");
        next
    }

    /// 2^64 / base target, added to the predecessor's cumulative difficulty
    pub fn next_cumulative_difficulty(
        previous_cumulative: &BigInt,
        base_target: &BigInt,
    ) -> Result<BigInt> {
        if base_target.sign() != Sign::Plus {
            return Err(LedgerError::InvalidBlock(format!(
                "Base target must be positive, got {base_target}"
            )));
        }
        let two64 = BigInt::from(1u8) << 64usize;
        Ok(previous_cumulative + two64 / base_target)
    }
}
