//! Uniswap V2 AMM math with exact integer calculations
//!
//! Same rounding as `UniswapV2Library`: outputs round down, required inputs
//! round up. Reserves and amounts are raw token units.

use ethers_core::types::{U256, U512};
use rust_decimal::Decimal;

use crate::slippage::BPS_DENOMINATOR;
use crate::{AmmError, Result};

/// Standard V2 pair fee (0.3%)
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Decimal places kept in price impact percentages
const IMPACT_SCALE: u32 = 18;

/// Pool reserves and fee structure for V2 AMMs, oriented in trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V2PoolState {
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub fee_bps: u32, // Fee in basis points (30 = 0.3%)
}

impl V2PoolState {
    pub fn new(reserve_in: U256, reserve_out: U256) -> Self {
        Self {
            reserve_in,
            reserve_out,
            fee_bps: DEFAULT_FEE_BPS,
        }
    }

    pub fn amount_out(&self, amount_in: U256) -> Result<U256> {
        V2Math::get_amount_out(amount_in, self.reserve_in, self.reserve_out, self.fee_bps)
    }
}

/// Amounts actually deposited by `addLiquidity` after the router balances the legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAmounts {
    pub amount_a: U256,
    pub amount_b: U256,
}

/// V2 AMM math functions
pub struct V2Math;

impl V2Math {
    /// Output amount for an exact input using x*y=k with the pair fee
    ///
    /// `amount_in_with_fee * reserve_out / (reserve_in * 10000 + amount_in_with_fee)`
    pub fn get_amount_out(
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
        fee_bps: u32,
    ) -> Result<U256> {
        if amount_in.is_zero() {
            return Err(AmmError::ZeroInput);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }

        let amount_in_with_fee = amount_in
            .checked_mul(U256::from(BPS_DENOMINATOR - fee_bps))
            .ok_or(AmmError::Overflow("amount_in_with_fee"))?;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or(AmmError::Overflow("numerator"))?;
        let denominator = reserve_in
            .checked_mul(U256::from(BPS_DENOMINATOR))
            .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
            .ok_or(AmmError::Overflow("denominator"))?;

        Ok(numerator / denominator)
    }

    /// Chained outputs along a multi-hop path, like `getAmountsOut`
    ///
    /// The first element is `amount_in`; there is one more element than hops.
    pub fn get_amounts_out(amount_in: U256, hops: &[V2PoolState]) -> Result<Vec<U256>> {
        if hops.is_empty() {
            return Err(AmmError::InvalidPath);
        }

        let mut amounts = Vec::with_capacity(hops.len() + 1);
        amounts.push(amount_in);
        let mut current = amount_in;
        for hop in hops {
            current = hop.amount_out(current)?;
            amounts.push(current);
        }
        Ok(amounts)
    }

    /// Equivalent amount of the other asset at the current reserve ratio
    pub fn quote(amount_a: U256, reserve_a: U256, reserve_b: U256) -> Result<U256> {
        if amount_a.is_zero() {
            return Err(AmmError::ZeroInput);
        }
        if reserve_a.is_zero() || reserve_b.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }
        let product = amount_a
            .checked_mul(reserve_b)
            .ok_or(AmmError::Overflow("quote"))?;
        Ok(product / reserve_a)
    }

    /// Leg amounts the router deposits for `addLiquidity`
    ///
    /// An empty pair takes both desired amounts as-is. Otherwise one leg is
    /// reduced to match the reserve ratio and must stay above its minimum.
    pub fn add_liquidity_amounts(
        desired_a: U256,
        desired_b: U256,
        min_a: U256,
        min_b: U256,
        reserve_a: U256,
        reserve_b: U256,
    ) -> Result<LiquidityAmounts> {
        if reserve_a.is_zero() && reserve_b.is_zero() {
            return Ok(LiquidityAmounts {
                amount_a: desired_a,
                amount_b: desired_b,
            });
        }

        let optimal_b = Self::quote(desired_a, reserve_a, reserve_b)?;
        if optimal_b <= desired_b {
            if optimal_b < min_b {
                return Err(AmmError::InsufficientLegAmount {
                    leg: "B",
                    optimal: optimal_b,
                    minimum: min_b,
                });
            }
            return Ok(LiquidityAmounts {
                amount_a: desired_a,
                amount_b: optimal_b,
            });
        }

        let optimal_a = Self::quote(desired_b, reserve_b, reserve_a)?;
        if optimal_a < min_a {
            return Err(AmmError::InsufficientLegAmount {
                leg: "A",
                optimal: optimal_a,
                minimum: min_a,
            });
        }
        Ok(LiquidityAmounts {
            amount_a: optimal_a.min(desired_a),
            amount_b: desired_b,
        })
    }

    /// Price impact of a trade as a percentage (fee excluded)
    pub fn calculate_price_impact(
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<Decimal> {
        if amount_in.is_zero() {
            return Err(AmmError::ZeroInput);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }

        let amount_out = Self::get_amount_out(amount_in, reserve_in, reserve_out, 0)?;

        // 1 - price_after / price_before, cross-multiplied so reserves of any
        // uint112 size stay exact:
        // ((r_in + in) * r_out - (r_out - out) * r_in) / ((r_in + in) * r_out)
        let new_reserve_in = reserve_in
            .checked_add(amount_in)
            .ok_or(AmmError::Overflow("reserve_in"))?;
        let before = new_reserve_in.full_mul(reserve_out);
        let after = (reserve_out - amount_out).full_mul(reserve_in);

        let scaled = (before - after)
            .checked_mul(U512::from(100u64) * U512::exp10(IMPACT_SCALE as usize))
            .ok_or(AmmError::Overflow("price_impact"))?
            / before;

        // At most 100 * 10^IMPACT_SCALE
        Ok(Decimal::from_i128_with_scale(scaled.low_u128() as i128, IMPACT_SCALE).normalize())
    }
}
