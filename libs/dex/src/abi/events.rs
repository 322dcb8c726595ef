//! Swap log decoding
//!
//! Type-safe decoding of V2 pair `Swap` logs through ethabi rather than manual
//! byte slicing.

use super::uniswap_v2;
use crate::event_signatures::{to_hex_string, UNISWAP_V2_SWAP};
use ethabi::{RawLog, Token};
use ethers::types::{Address, Log, H256, U256};

/// Error types for ABI decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("Unknown event signature: {0}")]
    UnknownEventSignature(String),

    #[error("Log has no topics")]
    MissingTopics,

    #[error("ABI parsing failed: {0}")]
    AbiParsingError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Decoded V2 swap with direction resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSwap {
    pub pair: Address,
    pub sender: Address,
    pub recipient: Address,
    /// Whichever of `amount0In`/`amount1In` is non-zero
    pub amount_in: U256,
    /// Whichever of `amount0Out`/`amount1Out` is non-zero
    pub amount_out: U256,
    pub token_in_is_token0: bool,
    pub transaction_hash: Option<H256>,
    pub block_number: Option<u64>,
}

/// ABI decoder for V2 Swap events
pub struct SwapEventDecoder;

impl SwapEventDecoder {
    pub fn decode(log: &Log) -> Result<ValidatedSwap, DecodingError> {
        let topic0 = log.topics.first().ok_or(DecodingError::MissingTopics)?;
        if *topic0 != UNISWAP_V2_SWAP {
            return Err(DecodingError::UnknownEventSignature(to_hex_string(*topic0)));
        }

        let raw_log = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };

        let decoded = uniswap_v2::swap_event()
            .parse_log(raw_log)
            .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?;

        let address_at = |index: usize, name: &str| -> Result<Address, DecodingError> {
            decoded
                .params
                .get(index)
                .and_then(|p| p.value.clone().into_address())
                .ok_or_else(|| DecodingError::MissingField(name.to_string()))
        };
        let uint_at = |index: usize, name: &str| -> Result<U256, DecodingError> {
            decoded
                .params
                .get(index)
                .and_then(|p| match &p.value {
                    Token::Uint(v) => Some(*v),
                    _ => None,
                })
                .ok_or_else(|| DecodingError::MissingField(name.to_string()))
        };

        let sender = address_at(0, "sender")?;
        let amount0_in = uint_at(1, "amount0In")?;
        let amount1_in = uint_at(2, "amount1In")?;
        let amount0_out = uint_at(3, "amount0Out")?;
        let amount1_out = uint_at(4, "amount1Out")?;
        let recipient = address_at(5, "to")?;

        let token_in_is_token0 = !amount0_in.is_zero();
        let amount_in = if token_in_is_token0 { amount0_in } else { amount1_in };
        let amount_out = if amount0_out.is_zero() { amount1_out } else { amount0_out };

        Ok(ValidatedSwap {
            pair: log.address,
            sender,
            recipient,
            amount_in,
            amount_out,
            token_in_is_token0,
            transaction_hash: log.transaction_hash,
            block_number: log.block_number.map(|n| n.as_u64()),
        })
    }

    /// Topic value for filtering on an indexed address parameter
    pub fn address_topic(address: Address) -> H256 {
        H256::from(address)
    }
}
