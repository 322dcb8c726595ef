//! Wallet session
//!
//! Holds the active connection and broadcasts account/chain changes. Every
//! flow asks the session for its [`ChainClient`] at call time, so a switch of
//! account or chain is picked up on the next read without caching.

use ethers::types::Address;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use swapdesk_config::network;

use crate::chain::ChainClient;
use crate::error::{ClientError, Result};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connected(Address),
    AccountsChanged(Address),
    ChainChanged { from: u64, to: u64 },
    Disconnected,
}

#[derive(Clone)]
struct Connection {
    client: Arc<dyn ChainClient>,
    address: Address,
    chain_id: u64,
}

pub struct WalletSession {
    connection: RwLock<Option<Connection>>,
    events: broadcast::Sender<WalletEvent>,
}

impl WalletSession {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            connection: RwLock::new(None),
            events,
        }
    }

    /// Make `client` the active connection.
    ///
    /// Replacing a connection for a different address is reported as an
    /// account change.
    pub async fn attach(&self, client: Arc<dyn ChainClient>) -> Result<Address> {
        let chain_id = client.chain_id().await?;
        let address = client.account();

        match network(chain_id) {
            Some(info) => info!("🔗 Connected to {} (chain {}) as {:?}", info.name, chain_id, address),
            None => warn!(
                "⚠️ Chain {} is not a supported network; contract calls may fail",
                chain_id
            ),
        }

        let previous = self.connection.write().replace(Connection {
            client,
            address,
            chain_id,
        });

        let event = match previous {
            Some(prev) if prev.address != address => WalletEvent::AccountsChanged(address),
            Some(_) => return Ok(address),
            None => WalletEvent::Connected(address),
        };
        self.publish(event);
        Ok(address)
    }

    pub fn disconnect(&self) {
        if self.connection.write().take().is_some() {
            info!("🔌 Wallet disconnected");
            self.publish(WalletEvent::Disconnected);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }

    pub fn client(&self) -> Result<Arc<dyn ChainClient>> {
        self.connection
            .read()
            .as_ref()
            .map(|c| c.client.clone())
            .ok_or(ClientError::NotConnected)
    }

    pub fn address(&self) -> Option<Address> {
        self.connection.read().as_ref().map(|c| c.address)
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.connection.read().as_ref().map(|c| c.chain_id)
    }

    /// Re-read the chain id from the node.
    ///
    /// Returns true when it changed; callers must then re-derive everything
    /// they hold, since addresses and balances belong to the old chain.
    pub async fn sync_chain(&self) -> Result<bool> {
        let client = self.client()?;
        let current = client.chain_id().await?;

        let from = {
            let mut guard = self.connection.write();
            let connection = guard.as_mut().ok_or(ClientError::NotConnected)?;
            if connection.chain_id == current {
                return Ok(false);
            }
            std::mem::replace(&mut connection.chain_id, current)
        };

        warn!("🔄 Chain changed from {} to {}", from, current);
        self.publish(WalletEvent::ChainChanged { from, to: current });
        Ok(true)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: WalletEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}
