//! Chains the client recognises
//!
//! Connecting to an unlisted chain is allowed; callers only warn.

use crate::addresses::{parse_static, ContractAddresses};

/// Canonical Uniswap V2 deployment on a public chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownAddresses {
    pub weth: &'static str,
    pub factory: &'static str,
    pub router: &'static str,
    pub dai: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: &'static str,
    pub addresses: Option<KnownAddresses>,
}

impl NetworkInfo {
    /// Replace token/router/factory addresses with this network's canonical ones.
    ///
    /// The pair address is deployment specific and left untouched. Returns
    /// whether anything was applied.
    pub fn overlay(&self, addresses: &mut ContractAddresses) -> bool {
        match self.addresses {
            Some(known) => {
                addresses.weth = parse_static(known.weth);
                addresses.factory = parse_static(known.factory);
                addresses.router = parse_static(known.router);
                addresses.dai = parse_static(known.dai);
                true
            }
            None => false,
        }
    }
}

pub const SUPPORTED_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        chain_id: 1,
        name: "Mainnet",
        addresses: Some(KnownAddresses {
            weth: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
            factory: "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
            router: "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            dai: "0x6B175474E89094C44Da98b954EedeAC495271d0F",
        }),
    },
    NetworkInfo {
        chain_id: 11155111,
        name: "Sepolia",
        addresses: None,
    },
    NetworkInfo {
        chain_id: 1337,
        name: "Ganache",
        addresses: None,
    },
];

pub fn network(chain_id: u64) -> Option<&'static NetworkInfo> {
    SUPPORTED_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

pub fn is_network_supported(chain_id: u64) -> bool {
    network(chain_id).is_some()
}
