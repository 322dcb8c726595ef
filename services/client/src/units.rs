//! Amount parsing and display in 18-decimal token units

use ethers::types::U256;
use ethers::utils::{format_units, parse_ether};

use crate::error::{ClientError, Result};

/// Parse a user-entered decimal amount (e.g. `"0.5"`) into wei.
///
/// Empty, negative, malformed and zero amounts are all rejected with
/// "Please enter a valid amount".
pub fn parse_amount(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(ClientError::InvalidAmount);
    }

    let amount = parse_ether(trimmed).map_err(|_| ClientError::InvalidAmount)?;
    if amount.is_zero() {
        return Err(ClientError::InvalidAmount);
    }
    Ok(amount)
}

/// Format wei as a decimal string with trailing zeros removed, keeping at
/// least one fractional digit (`1000.0`, `0.5`).
pub fn format_amount(amount: U256) -> String {
    let full = match format_units(amount, "ether") {
        Ok(s) => s,
        Err(_) => return amount.to_string(),
    };

    match full.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => format!("{}.0", full),
    }
}

/// Format a gas price in gwei
pub fn format_gwei(amount: U256) -> String {
    format_units(amount, "gwei")
        .map(|s| {
            let s = s.trim_end_matches('0');
            s.trim_end_matches('.').to_string()
        })
        .unwrap_or_else(|_| amount.to_string())
}
