//! Client settings
//!
//! Loaded from an optional TOML file, then overridden by `SWAPDESK_*`
//! environment variables. Nested keys use a double underscore, so
//! `SWAPDESK_GAS__SWAP=600000` sets `gas.swap`.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/swapdesk.toml";
pub const ENV_PREFIX: &str = "SWAPDESK";

/// Smallest gas limit a transaction can carry
const MIN_GAS_LIMIT: u64 = 21_000;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,
    /// Hex private key; node-managed accounts are used when absent
    pub private_key: Option<String>,
    /// Index into `eth_accounts` when using node-managed accounts
    pub account_index: usize,
    /// Refuse to run against any other chain when set
    pub expected_chain_id: Option<u64>,
    pub slippage_bps: u32,
    pub swap_deadline_secs: u64,
    pub liquidity_deadline_secs: u64,
    pub gas: GasSettings,
    pub history: HistorySettings,
    /// ETH kept back for gas when adding liquidity (wei)
    pub liquidity_gas_reserve_wei: u64,
    pub confirmation_timeout_secs: u64,
}

/// Fixed gas limits per transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSettings {
    pub swap: u64,
    pub add_liquidity: u64,
    pub approve: u64,
    pub mint: u64,
    pub deposit: u64,
    pub withdraw: u64,
    /// Added on top of the node's deposit estimate when wrapping
    pub wrap_buffer: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub block_window: u64,
    pub max_entries: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:7545".to_string(),
            private_key: None,
            account_index: 0,
            expected_chain_id: None,
            slippage_bps: 100,           // 1%
            swap_deadline_secs: 1200,    // 20 minutes
            liquidity_deadline_secs: 600, // 10 minutes
            gas: GasSettings::default(),
            history: HistorySettings::default(),
            liquidity_gas_reserve_wei: 100_000_000_000_000_000, // 0.1 ETH
            confirmation_timeout_secs: 120,
        }
    }
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            swap: 500_000,
            add_liquidity: 500_000,
            approve: 100_000,
            mint: 200_000,
            deposit: 200_000,
            withdraw: 100_000,
            wrap_buffer: 10_000,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            block_window: 1000,
            max_entries: 10,
        }
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("account_index", &self.account_index)
            .field("expected_chain_id", &self.expected_chain_id)
            .field("slippage_bps", &self.slippage_bps)
            .field("swap_deadline_secs", &self.swap_deadline_secs)
            .field("liquidity_deadline_secs", &self.liquidity_deadline_secs)
            .field("gas", &self.gas)
            .field("history", &self.history)
            .field("liquidity_gas_reserve_wei", &self.liquidity_gas_reserve_wei)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .finish()
    }
}

impl ClientSettings {
    /// Load from `path` (or the default location) plus process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder();
        if file.exists() {
            info!("📄 Loading client settings from {:?}", file);
            builder = builder.add_source(File::from(file).required(true));
        } else if path.is_some() {
            anyhow::bail!("Settings file not found: {:?}", file);
        } else {
            debug!("No settings file at {:?}, using defaults", file);
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            anyhow::bail!("rpc_url must not be empty");
        }

        if self.slippage_bps > 10_000 {
            anyhow::bail!("slippage_bps must be <= 10000 (100%)");
        }

        let gas = &self.gas;
        for (name, limit) in [
            ("swap", gas.swap),
            ("add_liquidity", gas.add_liquidity),
            ("approve", gas.approve),
            ("mint", gas.mint),
            ("deposit", gas.deposit),
            ("withdraw", gas.withdraw),
        ] {
            if limit < MIN_GAS_LIMIT {
                anyhow::bail!("gas.{} must be at least {}", name, MIN_GAS_LIMIT);
            }
        }

        if self.swap_deadline_secs == 0 || self.liquidity_deadline_secs == 0 {
            anyhow::bail!("transaction deadlines must be positive");
        }

        if self.history.block_window == 0 {
            anyhow::bail!("history.block_window must be positive");
        }

        if self.history.max_entries == 0 {
            anyhow::bail!("history.max_entries must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_default_settings_validation() {
        let settings = ClientSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.rpc_url, "http://127.0.0.1:7545");
        assert_eq!(settings.gas.swap, 500_000);
        assert_eq!(settings.gas.wrap_buffer, 10_000);
        assert_eq!(settings.history.block_window, 1000);
        assert_eq!(settings.history.max_entries, 10);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        assert!(ClientSettings::load_with_env(Some(&missing), env(&[])).is_err());

        let settings = ClientSettings::load_with_env(None, env(&[])).unwrap();
        assert_eq!(settings.slippage_bps, 100);
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("swapdesk.toml");

        let config_content = r#"
rpc_url = "http://localhost:8545"
account_index = 2
expected_chain_id = 1337

[gas]
swap = 650000

[history]
max_entries = 25
"#;
        fs::write(&config_path, config_content).unwrap();

        let settings = ClientSettings::load_with_env(Some(&config_path), env(&[])).unwrap();

        assert_eq!(settings.rpc_url, "http://localhost:8545");
        assert_eq!(settings.account_index, 2);
        assert_eq!(settings.expected_chain_id, Some(1337));
        assert_eq!(settings.gas.swap, 650_000);
        // Untouched keys in a partial table keep defaults
        assert_eq!(settings.gas.approve, 100_000);
        assert_eq!(settings.history.max_entries, 25);
        assert_eq!(settings.history.block_window, 1000);
    }

    #[test]
    fn test_env_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("swapdesk.toml");
        fs::write(&config_path, "rpc_url = \"http://file:8545\"\n").unwrap();

        let settings = ClientSettings::load_with_env(
            Some(&config_path),
            env(&[
                ("SWAPDESK_RPC_URL", "http://env:8545"),
                ("SWAPDESK_GAS__DEPOSIT", "250000"),
                ("SWAPDESK_SLIPPAGE_BPS", "50"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.rpc_url, "http://env:8545");
        assert_eq!(settings.gas.deposit, 250_000);
        assert_eq!(settings.slippage_bps, 50);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = ClientSettings::default();
        settings.slippage_bps = 10_001;
        assert!(settings.validate().is_err());

        let mut settings = ClientSettings::default();
        settings.gas.approve = 20_999;
        assert!(settings.validate().is_err());

        let mut settings = ClientSettings::default();
        settings.swap_deadline_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = ClientSettings::default();
        settings.history.block_window = 0;
        assert!(settings.validate().is_err());

        let mut settings = ClientSettings::default();
        settings.rpc_url = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let settings = ClientSettings {
            private_key: Some("0xdeadbeef".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("<redacted>"));
    }
}
