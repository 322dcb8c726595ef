//! Wallet connector
//!
//! Builds an ethers client from [`ClientSettings`] and attaches it to a
//! [`WalletSession`]. A configured private key signs locally; otherwise the
//! node's own accounts (`eth_accounts`) are used, as a dev node or an
//! unlocked wallet provides them.

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

use swapdesk_config::ClientSettings;

use crate::chain::ChainClient;
use crate::error::{ClientError, Result};
use crate::rpc_client::EthersChain;
use crate::wallet::WalletSession;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROVIDER_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct WalletConnector {
    settings: ClientSettings,
}

impl WalletConnector {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    /// Connect with the configured account
    pub async fn connect(&self, session: &WalletSession) -> Result<Address> {
        self.connect_account(session, self.settings.account_index).await
    }

    /// Connect (or switch) to the node-managed account at `index`.
    ///
    /// Ignored for local keys, which only ever have one account.
    pub async fn connect_account(&self, session: &WalletSession, index: usize) -> Result<Address> {
        let start = Instant::now();
        info!("🚀 Connecting wallet via {}", self.settings.rpc_url);

        let provider = self.provider()?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?
            .as_u64();

        if let Some(expected) = self.settings.expected_chain_id {
            if expected != chain_id {
                return Err(ClientError::UnexpectedChain {
                    expected,
                    actual: chain_id,
                });
            }
        }

        let client: Arc<dyn ChainClient> = match &self.settings.private_key {
            Some(key) => {
                let wallet = key
                    .parse::<LocalWallet>()
                    .map_err(|_| ClientError::Config("Invalid private key format".to_string()))?
                    .with_chain_id(chain_id);
                let account = wallet.address();
                let signer = SignerMiddleware::new(provider, wallet);
                Arc::new(EthersChain::new(Arc::new(signer), account))
            }
            None => {
                let accounts = provider
                    .get_accounts()
                    .await
                    .map_err(|e| ClientError::Rpc(e.to_string()))?;

                let Some(account) = accounts.get(index).copied() else {
                    if accounts.is_empty() {
                        warn!("Node reports no accounts");
                        session.disconnect();
                    } else {
                        warn!("Account index {} out of range ({} available)", index, accounts.len());
                    }
                    return Err(ClientError::NoAccount);
                };

                let provider = provider.with_sender(account);
                Arc::new(EthersChain::new(Arc::new(provider), account))
            }
        };

        let address = session.attach(client).await?;
        info!(
            "✅ Wallet connected in {}ms: {:?}",
            start.elapsed().as_millis(),
            address
        );
        Ok(address)
    }

    fn provider(&self) -> Result<Provider<Http>> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Rpc(format!("Failed to create HTTP client: {}", e)))?;

        let url: Url = self
            .settings
            .rpc_url
            .parse()
            .map_err(|_| ClientError::Config(format!("Invalid RPC URL: {}", self.settings.rpc_url)))?;

        let transport = Http::new_with_client(url, http_client);
        Ok(Provider::new(transport).interval(PROVIDER_POLL_INTERVAL))
    }
}
