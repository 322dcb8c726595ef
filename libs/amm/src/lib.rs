//! # SwapDesk AMM Library - Client-Side V2 Arithmetic
//!
//! ## Purpose
//!
//! Integer arithmetic that mirrors what the vendored Uniswap V2 router and pair
//! contracts do on-chain, so the client can preview swaps, compute slippage
//! bounds and deadlines before it asks the router for an authoritative quote.
//!
//! ## Integration Points
//!
//! - **Submitter**: minimum-output and minimum-leg amounts for swaps and
//!   liquidity provision ([`SlippageTolerance`]), transaction deadlines
//! - **Reader**: price impact previews from pair reserves
//! - **Test chain**: the in-memory chain in `swapdesk-client` settles swaps
//!   and liquidity with the same formulas the pair contract uses
//!
//! All amounts are raw token units (wei) as [`U256`]; nothing here touches
//! floating point. Percentages for display use [`Decimal`].

pub mod slippage;
pub mod v2_math;

pub use slippage::{deadline_from, SlippageTolerance, BPS_DENOMINATOR};
pub use v2_math::{LiquidityAmounts, V2Math, V2PoolState, DEFAULT_FEE_BPS};

pub use ethers_core::types::U256;
pub use rust_decimal::Decimal;

/// Errors raised by client-side AMM calculations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmmError {
    #[error("Input amount must be positive")]
    ZeroInput,

    #[error("Reserves must be positive")]
    InsufficientLiquidity,

    #[error("Insufficient {leg} amount: optimal {optimal} is below minimum {minimum}")]
    InsufficientLegAmount {
        leg: &'static str,
        optimal: U256,
        minimum: U256,
    },

    #[error("Swap path must contain at least two tokens")]
    InvalidPath,

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Slippage tolerance {0} bps exceeds 10000")]
    InvalidTolerance(u32),
}

pub type Result<T> = std::result::Result<T, AmmError>;
