//! # SwapDesk Configuration
//!
//! Everything a SwapDesk client needs to know before it talks to a node:
//!
//! - **Contract Addresses**: WETH, factory, router, DAI and the WETH/DAI pair,
//!   read from the environment with local-deployment fallbacks
//! - **Network Registry**: chains the client recognises and their canonical
//!   contract addresses
//! - **Client Settings**: RPC endpoint, signer, gas limits, deadlines and
//!   history window, loaded from TOML with `SWAPDESK_*` overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use swapdesk_config::{ClientSettings, ContractAddresses, is_network_supported};
//!
//! let settings = ClientSettings::load(None)?;
//! let addresses = ContractAddresses::from_env();
//! assert!(is_network_supported(1));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod addresses;
pub mod networks;
pub mod settings;

pub use addresses::ContractAddresses;
pub use networks::{is_network_supported, network, KnownAddresses, NetworkInfo, SUPPORTED_NETWORKS};
pub use settings::{ClientSettings, GasSettings, HistorySettings, DEFAULT_CONFIG_PATH};
