//! Slippage bounds and transaction deadlines
//!
//! The router enforces `amountOutMin`/`amountAMin`/`amountBMin` on-chain; the
//! client only decides how far below the quote it is willing to go.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use crate::{AmmError, Result};

/// Basis point denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Maximum acceptable shortfall from a quoted amount, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageTolerance {
    bps: u32,
}

impl SlippageTolerance {
    /// 1%, the tolerance used for swaps and both liquidity legs
    pub const ONE_PERCENT: Self = Self { bps: 100 };

    pub fn from_bps(bps: u32) -> Result<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(AmmError::InvalidTolerance(bps));
        }
        Ok(Self { bps })
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }

    /// Lowest acceptable amount: `amount * (10000 - bps) / 10000`, floored.
    ///
    /// At 100 bps this is exactly `amount * 99 / 100` with integer division.
    pub fn minimum_amount(&self, amount: U256) -> U256 {
        let keep = U256::from(BPS_DENOMINATOR - self.bps);
        match amount.checked_mul(keep) {
            Some(scaled) => scaled / U256::from(BPS_DENOMINATOR),
            // amount is within 2^14 of U256::MAX; divide first and accept the
            // extra rounding at that magnitude
            None => amount / U256::from(BPS_DENOMINATOR) * keep,
        }
    }
}

impl Default for SlippageTolerance {
    fn default() -> Self {
        Self::ONE_PERCENT
    }
}

/// Absolute unix deadline `offset_secs` after `now_secs`
pub fn deadline_from(now_secs: u64, offset_secs: u64) -> U256 {
    U256::from(now_secs.saturating_add(offset_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_percent_minimum() {
        let tolerance = SlippageTolerance::default();
        assert_eq!(tolerance.bps(), 100);

        assert_eq!(tolerance.minimum_amount(U256::from(1000u64)), U256::from(990u64));
        // 199 * 99 / 100 = 197.01 -> 197
        assert_eq!(tolerance.minimum_amount(U256::from(199u64)), U256::from(197u64));
        assert_eq!(tolerance.minimum_amount(U256::zero()), U256::zero());
    }

    #[test]
    fn test_tolerance_bounds() {
        assert!(SlippageTolerance::from_bps(10_000).is_ok());
        assert_eq!(
            SlippageTolerance::from_bps(10_001),
            Err(AmmError::InvalidTolerance(10_001))
        );

        let zero = SlippageTolerance::from_bps(0).unwrap();
        assert_eq!(zero.minimum_amount(U256::from(42u64)), U256::from(42u64));

        let full = SlippageTolerance::from_bps(10_000).unwrap();
        assert_eq!(full.minimum_amount(U256::from(42u64)), U256::zero());
    }

    #[test]
    fn test_minimum_amount_near_max_does_not_panic() {
        let tolerance = SlippageTolerance::default();
        let min = tolerance.minimum_amount(U256::MAX);
        assert!(min < U256::MAX);
    }

    #[test]
    fn test_deadline() {
        assert_eq!(deadline_from(1_700_000_000, 1200), U256::from(1_700_001_200u64));
        assert_eq!(deadline_from(u64::MAX, 10), U256::from(u64::MAX));
    }

    proptest! {
        #[test]
        fn minimum_is_floor_of_ninety_nine_percent(raw in any::<u128>()) {
            let amount = U256::from(raw);
            let expected = amount * U256::from(99u64) / U256::from(100u64);
            prop_assert_eq!(SlippageTolerance::ONE_PERCENT.minimum_amount(amount), expected);
        }
    }
}
