//! # SwapDesk Client
//!
//! Typed client for a locally deployed Uniswap V2 fork (factory, router, the
//! WETH/DAI pair and the mock WETH/DAI tokens).
//!
//! ## Pipeline
//!
//! ```text
//! WalletConnector -> WalletSession -> BalanceReader / TransactionSubmitter -> HistoryReader
//! ```
//!
//! Every component reaches the node through the [`ChainClient`] trait held
//! by the [`WalletSession`]. [`rpc_client::EthersChain`] talks JSON-RPC;
//! [`testing::MockChain`] keeps the whole chain in memory.
//!
//! The pair math and reserve accounting run on-chain; this crate only
//! previews them and enforces the client-side checks (amount validity,
//! balances, allowances, slippage bounds, deadlines).

pub mod chain;
pub mod connector;
pub mod error;
pub mod history;
pub mod reader;
pub mod rpc_client;
pub mod submitter;
pub mod testing;
pub mod units;
pub mod verify;
pub mod wallet;

pub use chain::{ChainClient, TxOutcome};
pub use connector::WalletConnector;
pub use error::{ClientError, Result};
pub use history::{HistoryEntry, HistoryReader, HistorySource, TransactionHistory, TxStatus};
pub use reader::{Balances, BalanceReader, PoolSnapshot, SwapPreview, TransactQuote, WrapQuote};
pub use submitter::{
    Action, ActionStatus, AddLiquidityRequest, LiquidityReport, SwapReceipt, TransactionSubmitter,
};
pub use verify::{DeploymentReport, DeploymentVerifier, LinkCheck};
pub use wallet::{WalletEvent, WalletSession};

use std::sync::Arc;

use swapdesk_amm::SlippageTolerance;
use swapdesk_config::{ClientSettings, ContractAddresses};

/// All client components sharing one wallet session
pub struct SwapDesk {
    pub session: Arc<WalletSession>,
    pub reader: BalanceReader,
    pub submitter: TransactionSubmitter,
    pub history: HistoryReader,
    pub verifier: DeploymentVerifier,
}

impl SwapDesk {
    pub fn new(addresses: ContractAddresses, settings: ClientSettings) -> Result<Self> {
        let session = Arc::new(WalletSession::new());
        let tolerance = SlippageTolerance::from_bps(settings.slippage_bps)?;

        Ok(Self {
            reader: BalanceReader::new(session.clone(), addresses, tolerance)
                .with_wrap_buffer(settings.gas.wrap_buffer),
            history: HistoryReader::new(session.clone(), addresses, settings.history),
            verifier: DeploymentVerifier::new(session.clone(), addresses),
            submitter: TransactionSubmitter::new(session.clone(), addresses, settings)?,
            session,
        })
    }
}
