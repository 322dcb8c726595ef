//! Recent swap history
//!
//! Scans the WETH/DAI pair (as the factory reports it) for `Swap` logs paid
//! out to the user within the last `block_window` blocks and enriches each one with its receipt, block
//! timestamp and nonce. When the scan fails, or finds nothing, a fixed set of
//! example entries is returned instead so the view is never empty.

use chrono::DateTime;
use ethers::types::{Address, Log};
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use swapdesk_config::{ContractAddresses, HistorySettings};
use swapdesk_dex::SwapEventDecoder;

use crate::chain::{ChainClient, SwapLogQuery};
use crate::error::{ClientError, Result};
use crate::units::format_amount;
use crate::wallet::WalletSession;

pub const FALLBACK_NOTICE: &str = "Failed to load real transaction history. Showing example data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxStatus {
    Success,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Success => write!(f, "Success"),
            TxStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// One row of the history table. Amounts are decimal strings in token units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub kind: &'static str,
    pub hash: String,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub input_amount: String,
    pub output_amount: String,
    /// Fee paid in ETH
    pub gas_cost: String,
    pub status: TxStatus,
    /// Unix seconds
    pub timestamp: u64,
    pub block_number: u64,
    pub nonce: u64,
}

impl HistoryEntry {
    /// `YYYY-MM-DD HH:MM:SS` in UTC
    pub fn time_display(&self) -> String {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistorySource {
    Chain,
    Example,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionHistory {
    pub entries: Vec<HistoryEntry>,
    pub source: HistorySource,
    /// Shown above the table when the scan failed
    pub notice: Option<String>,
}

impl TransactionHistory {
    fn example(notice: Option<String>) -> Self {
        Self {
            entries: example_entries(),
            source: HistorySource::Example,
            notice,
        }
    }
}

pub struct HistoryReader {
    session: Arc<WalletSession>,
    addresses: ContractAddresses,
    settings: HistorySettings,
}

impl HistoryReader {
    pub fn new(
        session: Arc<WalletSession>,
        addresses: ContractAddresses,
        settings: HistorySettings,
    ) -> Self {
        Self {
            session,
            addresses,
            settings,
        }
    }

    /// History of the connected account
    pub async fn load(&self) -> Result<TransactionHistory> {
        let client = self.session.client()?;
        let user = client.account();

        match self.fetch(client.as_ref(), user).await {
            Ok(entries) if !entries.is_empty() => {
                info!("📜 Loaded {} swaps for {:?}", entries.len(), user);
                Ok(TransactionHistory {
                    entries,
                    source: HistorySource::Chain,
                    notice: None,
                })
            }
            Ok(_) => {
                info!("No swaps found for {:?}, showing example data", user);
                Ok(TransactionHistory::example(None))
            }
            Err(e) => {
                warn!("Error fetching transaction history: {}", e);
                Ok(TransactionHistory::example(Some(FALLBACK_NOTICE.to_string())))
            }
        }
    }

    async fn fetch(&self, client: &dyn ChainClient, user: Address) -> Result<Vec<HistoryEntry>> {
        let pair = self.resolve_pair(client).await?;
        let head = client.block_number().await?;
        let query = SwapLogQuery {
            pair,
            recipient: user,
            from_block: head.saturating_sub(self.settings.block_window),
            to_block: head,
        };

        let logs = client.swap_logs(query).await?;
        debug!("Processing {} swap logs", logs.len());

        let enriched = join_all(logs.iter().map(|log| enrich(client, log))).await;
        let mut entries: Vec<HistoryEntry> = enriched
            .into_iter()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Error processing swap event: {}", e);
                    None
                }
            })
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(self.settings.max_entries);
        Ok(entries)
    }

    /// The pair swaps actually go through, same lookup as the reader
    async fn resolve_pair(&self, client: &dyn ChainClient) -> Result<Address> {
        let pair = client
            .get_pair(self.addresses.factory, self.addresses.weth, self.addresses.dai)
            .await?;
        if pair.is_zero() {
            return Err(ClientError::PoolNotFound);
        }
        if pair != self.addresses.weth_dai_pair {
            warn!(
                "Factory pair {:?} differs from configured WETH_DAI_PAIR {:?}, scanning the factory pair",
                pair, self.addresses.weth_dai_pair
            );
        }
        Ok(pair)
    }
}

async fn enrich(client: &dyn ChainClient, log: &Log) -> Result<HistoryEntry> {
    let swap = SwapEventDecoder::decode(log)?;
    let hash = swap
        .transaction_hash
        .ok_or_else(|| ClientError::Rpc("Swap log without transaction hash".to_string()))?;
    let details = client.tx_details(hash).await?;

    Ok(HistoryEntry {
        kind: "Swap",
        hash: format!("{:#x}", hash),
        from: Some(swap.sender),
        to: Some(swap.recipient),
        input_amount: format_amount(swap.amount_in),
        output_amount: format_amount(swap.amount_out),
        gas_cost: format_amount(details.outcome.gas_cost()),
        status: if details.outcome.success {
            TxStatus::Success
        } else {
            TxStatus::Failed
        },
        timestamp: details.timestamp,
        block_number: details.outcome.block_number,
        nonce: details.nonce,
    })
}

/// Placeholder rows shown when no real history is available
pub fn example_entries() -> Vec<HistoryEntry> {
    let entry = |hash: &str, input: &str, output: &str, gas: &str, status, timestamp, block, nonce| {
        HistoryEntry {
            kind: "Swap",
            hash: hash.to_string(),
            from: None,
            to: None,
            input_amount: input.to_string(),
            output_amount: output.to_string(),
            gas_cost: gas.to_string(),
            status,
            timestamp,
            block_number: block,
            nonce,
        }
    };

    vec![
        entry("0x123...abc", "0.5", "1000", "0.002134", TxStatus::Success, 1_710_513_000, 12_345_678, 42),
        entry("0x456...def", "1.2", "2400", "0.001897", TxStatus::Failed, 1_710_512_100, 12_345_677, 41),
        entry("0x789...ghi", "0.3", "600", "0.002001", TxStatus::Success, 1_710_511_200, 12_345_676, 40),
    ]
}
