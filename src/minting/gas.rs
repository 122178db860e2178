//! Gas pricing policy.
//!
//! Ceilings are hard caps: a bid is never raised above them, even when that
//! means the transaction may never be included.

use crate::blockchain::{ChainClient, ChainResult, GasParams};
use crate::config::GasConfig;

pub const GWEI: u128 = 1_000_000_000;

/// Configured fee ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCaps {
    pub max_gas_price_gwei: u64,
    pub max_priority_fee_gwei: u64,
}

impl GasCaps {
    pub fn max_gas_price_wei(&self) -> u128 {
        u128::from(self.max_gas_price_gwei) * GWEI
    }

    pub fn max_priority_fee_wei(&self) -> u128 {
        u128::from(self.max_priority_fee_gwei) * GWEI
    }
}

impl From<&GasConfig> for GasCaps {
    fn from(config: &GasConfig) -> Self {
        Self {
            max_gas_price_gwei: config.max_gas_price_gwei,
            max_priority_fee_gwei: config.max_priority_fee_gwei,
        }
    }
}

/// EIP-1559 bid from the latest base fee.
///
/// `priority = min(P, base / 10)`, `max_fee = min(G, base + priority)`, and
/// the priority fee never exceeds the max fee.
pub fn compute_gas_params(base_fee_wei: u128, caps: &GasCaps) -> GasParams {
    let priority = caps.max_priority_fee_wei().min(base_fee_wei / 10);
    let max_fee = caps
        .max_gas_price_wei()
        .min(base_fee_wei.saturating_add(priority));

    GasParams::Eip1559 {
        max_fee_per_gas: max_fee,
        max_priority_fee_per_gas: priority.min(max_fee),
    }
}

/// Legacy bid: the observed gas price, capped.
pub fn legacy_gas_params(observed_gas_price_wei: u128, caps: &GasCaps) -> GasParams {
    GasParams::Legacy {
        gas_price: observed_gas_price_wei.min(caps.max_gas_price_wei()),
    }
}

/// Price a transaction against the live chain.
///
/// Any failure to read the base fee falls back to legacy pricing, as does a
/// zero base fee; only the legacy gas price query can fail the quote.
pub async fn quote_gas(client: &dyn ChainClient, caps: &GasCaps) -> ChainResult<GasParams> {
    match client.base_fee().await {
        Ok(Some(base_fee)) if base_fee > 0 => {
            let params = compute_gas_params(base_fee, caps);
            tracing::debug!(base_fee_wei = base_fee, ?params, "Priced with base fee");
            return Ok(params);
        }
        Ok(_) => tracing::debug!("Chain reports no base fee, using legacy gas price"),
        Err(e) => tracing::warn!(error = %e, "Base fee unavailable, using legacy gas price"),
    }

    let observed = client.gas_price().await?;
    let params = legacy_gas_params(observed, caps);
    tracing::debug!(observed_wei = observed, ?params, "Priced with legacy gas price");
    Ok(params)
}
