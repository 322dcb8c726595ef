//! Deployed contract addresses
//!
//! Each address comes from its environment variable when set and parseable,
//! otherwise from the local Ganache deployment.

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const WETH_ENV: &str = "WETH_ADDRESS";
pub const FACTORY_ENV: &str = "FACTORY_ADDRESS";
pub const ROUTER_ENV: &str = "ROUTER_ADDRESS";
pub const DAI_ENV: &str = "DAI_ADDRESS";
pub const PAIR_ENV: &str = "WETH_DAI_PAIR";

/// Local deployment fallbacks
pub mod fallback {
    pub const WETH: &str = "0xB3ef7a156282E63c368594F3aFa2BfcAEa09413b";
    pub const FACTORY: &str = "0xf429d4EF861F8Cb22e2DfdCFba262BFb04576720";
    pub const ROUTER: &str = "0xc7852590882A8Bf5880901F3AE105Fa6b21d70eF";
    pub const DAI: &str = "0x10fE13C5cEEA63F71d8484aA4d5E55aF2dcccA72";
    pub const WETH_DAI_PAIR: &str = "0x3b8147Db5C523fEf4c6De683BDDB8943F6A6821A";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub weth: Address,
    pub factory: Address,
    pub router: Address,
    pub dai: Address,
    pub weth_dai_pair: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ContractAddresses {
    /// Resolve addresses from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve addresses through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let addresses = Self {
            weth: resolve(&lookup, WETH_ENV, fallback::WETH),
            factory: resolve(&lookup, FACTORY_ENV, fallback::FACTORY),
            router: resolve(&lookup, ROUTER_ENV, fallback::ROUTER),
            dai: resolve(&lookup, DAI_ENV, fallback::DAI),
            weth_dai_pair: resolve(&lookup, PAIR_ENV, fallback::WETH_DAI_PAIR),
        };

        debug!(
            weth = ?addresses.weth,
            factory = ?addresses.factory,
            router = ?addresses.router,
            dai = ?addresses.dai,
            pair = ?addresses.weth_dai_pair,
            "Contract addresses resolved"
        );

        addresses
    }

    /// Labelled list in the order deployment checks report them
    pub fn labelled(&self) -> [(&'static str, Address); 5] {
        [
            ("WETH", self.weth),
            ("Factory", self.factory),
            ("Router", self.router),
            ("DAI", self.dai),
            ("WETH-DAI Pair", self.weth_dai_pair),
        ]
    }
}

fn resolve<F>(lookup: &F, key: &str, fallback: &str) -> Address
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) {
        match raw.trim().parse::<Address>() {
            Ok(address) => return address,
            Err(e) => warn!("Ignoring {}={:?}: {}; using fallback {}", key, raw, e, fallback),
        }
    }
    parse_static(fallback)
}

/// Parse a compile-time address literal
pub(crate) fn parse_static(literal: &str) -> Address {
    literal.parse().unwrap_or_else(|_| {
        // Literals in this crate are checked by tests
        warn!("Malformed built-in address {}", literal);
        Address::zero()
    })
}
