//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ceilings, polls, delays)
//! - Check the contract section is usable before any RPC call
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MintBotConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::utils::parse_ether;
use alloy::primitives::Address;
use thiserror::Error;

use crate::config::networks;
use crate::config::schema::MintBotConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &MintBotConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bot = &config.bot;
    if bot.target_count == 0 {
        errors.push(ValidationError::new("bot.target_count", "must be at least 1"));
    }
    if !bot.retry_delay_secs.is_finite() || bot.retry_delay_secs < 0.0 {
        errors.push(ValidationError::new("bot.retry_delay_secs", "must be a non-negative number"));
    }
    if !bot.check_interval_secs.is_finite() || bot.check_interval_secs < 0.0 {
        errors.push(ValidationError::new("bot.check_interval_secs", "must be a non-negative number"));
    }
    if bot.enforce_retry_limit && bot.retry_count == 0 {
        errors.push(ValidationError::new(
            "bot.retry_count",
            "must be at least 1 when enforce_retry_limit is set",
        ));
    }
    if networks::lookup(&bot.network).is_none()
        && !config.networks.contains_key(&bot.network.to_ascii_lowercase())
    {
        errors.push(ValidationError::new(
            "bot.network",
            format!("unknown network '{}'; add a [networks.{}] section", bot.network, bot.network),
        ));
    }

    let contract = &config.contract;
    if contract.address.trim().is_empty() {
        errors.push(ValidationError::new("contract.address", "is required"));
    } else if contract.address.trim().parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "contract.address",
            format!("'{}' is not a valid address", contract.address),
        ));
    }
    if contract.abi.is_none() && contract.abi_path.is_none() {
        errors.push(ValidationError::new("contract.abi", "either abi or abi_path is required"));
    }
    if let Err(e) = parse_ether(contract.mint_price.trim()) {
        errors.push(ValidationError::new(
            "contract.mint_price",
            format!("'{}' is not an ether amount: {}", contract.mint_price, e),
        ));
    }
    if contract.entry_points.is_empty() {
        errors.push(ValidationError::new("contract.entry_points", "at least one entry point is required"));
    }

    let gas = &config.gas;
    if gas.max_gas_price_gwei == 0 {
        errors.push(ValidationError::new("gas.max_gas_price_gwei", "must be greater than 0"));
    }
    if gas.max_priority_fee_gwei > gas.max_gas_price_gwei {
        errors.push(ValidationError::new(
            "gas.max_priority_fee_gwei",
            "must not exceed max_gas_price_gwei",
        ));
    }
    if gas.gas_limit_multiplier_bps < 10_000 {
        errors.push(ValidationError::new(
            "gas.gas_limit_multiplier_bps",
            "must be at least 10000 (100%)",
        ));
    }
    if gas.default_gas_limit < 21_000 {
        errors.push(ValidationError::new("gas.default_gas_limit", "must be at least 21000"));
    }

    if config.confirmation.max_polls == 0 {
        errors.push(ValidationError::new("confirmation.max_polls", "must be at least 1"));
    }
    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
