//! Deployment verification
//!
//! Confirms that each configured address holds bytecode and that the router
//! was deployed against the configured factory and WETH.

use ethers::types::Address;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use swapdesk_config::ContractAddresses;

use crate::error::Result;
use crate::wallet::WalletSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCheck {
    pub label: &'static str,
    pub address: Address,
    pub code_size: usize,
    pub is_contract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkCheck {
    Matches,
    Mismatch { expected: Address, actual: Address },
    Unreadable(String),
}

impl LinkCheck {
    fn compare(expected: Address, actual: Address) -> Self {
        if expected == actual {
            LinkCheck::Matches
        } else {
            LinkCheck::Mismatch { expected, actual }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, LinkCheck::Matches)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    pub contracts: Vec<ContractCheck>,
    pub router_factory: LinkCheck,
    pub router_weth: LinkCheck,
}

impl DeploymentReport {
    pub fn is_healthy(&self) -> bool {
        self.contracts.iter().all(|c| c.is_contract)
            && self.router_factory.is_ok()
            && self.router_weth.is_ok()
    }
}

pub struct DeploymentVerifier {
    session: Arc<WalletSession>,
    addresses: ContractAddresses,
}

impl DeploymentVerifier {
    pub fn new(session: Arc<WalletSession>, addresses: ContractAddresses) -> Self {
        Self { session, addresses }
    }

    pub async fn verify(&self) -> Result<DeploymentReport> {
        let client = self.session.client()?;
        info!("🔍 Verifying contract deployments...");

        let mut contracts = Vec::with_capacity(5);
        for (label, address) in self.addresses.labelled() {
            let code_size = client.code_size(address).await?;
            let is_contract = code_size > 0;
            if is_contract {
                info!("   - {}: {:?} ({} bytes)", label, address, code_size);
            } else {
                warn!("   - {}: no code at {:?}", label, address);
            }
            contracts.push(ContractCheck {
                label,
                address,
                code_size,
                is_contract,
            });
        }

        let (router_factory, router_weth) = match client.router_links(self.addresses.router).await {
            Ok(links) => (
                LinkCheck::compare(self.addresses.factory, links.factory),
                LinkCheck::compare(self.addresses.weth, links.weth),
            ),
            Err(e) => {
                warn!("Error checking contract connections: {}", e);
                let reason = e.to_string();
                (LinkCheck::Unreadable(reason.clone()), LinkCheck::Unreadable(reason))
            }
        };

        Ok(DeploymentReport {
            contracts,
            router_factory,
            router_weth,
        })
    }
}
