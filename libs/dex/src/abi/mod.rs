//! ABI definitions and event decoding
//!
//! - Typed call bindings generated from human-readable ABIs
//! - Canonical ethabi event definitions used for log parsing
//! - Swap decoder with semantic validation

pub mod bindings;
pub mod events;
pub mod tokens;
pub mod uniswap_v2;

pub use events::{DecodingError, SwapEventDecoder, ValidatedSwap};
