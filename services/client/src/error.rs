//! Error types for the SwapDesk client
//!
//! Display strings are the status messages shown to the user.

use ethers::types::{H256, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("No wallet account available")]
    NoAccount,

    #[error("Another transaction is already pending")]
    ActionPending,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Amount exceeds maximum (including gas fees)")]
    ExceedsMaximum,

    #[error("Insufficient {0} balance")]
    InsufficientBalance(&'static str),

    #[error("Insufficient ETH balance. Need at least {} ETH (including gas)", display_eth(.required))]
    InsufficientEth { required: U256 },

    #[error("Pool does not exist")]
    PoolNotFound,

    #[error("Insufficient liquidity in the pool")]
    InsufficientLiquidity,

    #[error("Transaction was rejected")]
    Rejected,

    #[error("Insufficient funds for transaction")]
    InsufficientFunds,

    #[error("Price impact too high")]
    PriceImpact,

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Failed to approve {token} transfer: {source}")]
    Approval {
        token: &'static str,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Contract error: transaction 0x{0:x} reverted")]
    Reverted(H256),

    #[error("Transaction 0x{0:x} was not confirmed within {1}s")]
    ConfirmationTimeout(H256, u64),

    #[error("Connected to chain {actual}, expected {expected}")]
    UnexpectedChain { expected: u64, actual: u64 },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decoding error: {0}")]
    Decoding(#[from] swapdesk_dex::DecodingError),

    #[error("AMM error: {0}")]
    Amm(#[from] swapdesk_amm::AmmError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Wallet error code for a user-rejected request (EIP-1193)
pub const USER_REJECTED_CODE: i64 = 4001;

impl ClientError {
    /// Map a node or wallet failure onto the user-facing vocabulary
    pub fn classify(message: &str, code: Option<i64>) -> Self {
        let lower = message.to_lowercase();

        if code == Some(USER_REJECTED_CODE)
            || message.contains("ACTION_REJECTED")
            || lower.contains("user rejected")
        {
            Self::Rejected
        } else if lower.contains("insufficient funds") {
            Self::InsufficientFunds
        } else if message.contains("INSUFFICIENT_OUTPUT_AMOUNT") {
            Self::PriceImpact
        } else {
            Self::Contract(revert_reason(message).to_string())
        }
    }

    /// Checks that fail before anything is sent; shown without an action prefix
    pub fn is_precheck(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::ActionPending
                | Self::InvalidAmount
                | Self::ExceedsMaximum
                | Self::InsufficientBalance(_)
                | Self::InsufficientEth { .. }
                | Self::PoolNotFound
                | Self::InsufficientLiquidity
        )
    }
}

fn display_eth(amount: &U256) -> String {
    crate::units::format_amount(*amount)
}

/// Strip node boilerplate from a revert message
fn revert_reason(message: &str) -> &str {
    const PREFIXES: [&str; 3] = [
        "VM Exception while processing transaction: revert ",
        "execution reverted: ",
        "reverted with reason string ",
    ];

    for prefix in PREFIXES {
        if let Some(idx) = message.find(prefix) {
            return message[idx + prefix.len()..].trim_matches('\'').trim();
        }
    }
    message.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(matches!(
            ClientError::classify("whatever", Some(4001)),
            ClientError::Rejected
        ));
        assert!(matches!(
            ClientError::classify("code=ACTION_REJECTED", None),
            ClientError::Rejected
        ));
        assert!(matches!(
            ClientError::classify("MetaMask Tx Signature: User rejected the request.", None),
            ClientError::Rejected
        ));
        assert_eq!(
            ClientError::classify("", Some(4001)).to_string(),
            "Transaction was rejected"
        );
    }

    #[test]
    fn test_funds_and_slippage_classification() {
        let err = ClientError::classify("insufficient funds for gas * price + value", None);
        assert_eq!(err.to_string(), "Insufficient funds for transaction");

        let err = ClientError::classify(
            "VM Exception while processing transaction: revert UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT",
            Some(-32000),
        );
        assert_eq!(err.to_string(), "Price impact too high");
    }

    #[test]
    fn test_other_reverts_keep_reason() {
        let err = ClientError::classify(
            "VM Exception while processing transaction: revert UniswapV2Router: EXPIRED",
            None,
        );
        assert_eq!(err.to_string(), "Contract error: UniswapV2Router: EXPIRED");

        let err = ClientError::classify("execution reverted: TransferHelper: TRANSFER_FROM_FAILED", None);
        assert_eq!(err.to_string(), "Contract error: TransferHelper: TRANSFER_FROM_FAILED");

        let err = ClientError::classify("nonce too low", None);
        assert_eq!(err.to_string(), "Contract error: nonce too low");
    }

    #[test]
    fn test_precheck_split() {
        assert!(ClientError::InvalidAmount.is_precheck());
        assert!(ClientError::InsufficientBalance("WETH").is_precheck());
        assert!(!ClientError::Rejected.is_precheck());
        assert!(!ClientError::Contract("x".into()).is_precheck());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ClientError::InsufficientBalance("WETH").to_string(),
            "Insufficient WETH balance"
        );
        assert_eq!(
            ClientError::InsufficientEth {
                required: U256::exp10(17) * U256::from(51u64)
            }
            .to_string(),
            "Insufficient ETH balance. Need at least 5.1 ETH (including gas)"
        );
        let approval = ClientError::Approval {
            token: "WETH",
            source: Box::new(ClientError::Rejected),
        };
        assert_eq!(
            approval.to_string(),
            "Failed to approve WETH transfer: Transaction was rejected"
        );
    }
}
