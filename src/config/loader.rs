//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::MintBotConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<MintBotConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load configuration, apply environment overrides and validate.
///
/// A missing file is not an error: defaults are used, as the bot can be
/// configured from the environment alone.
pub fn load_config(path: &Path) -> Result<MintBotConfig, ConfigError> {
    let config = load_config_unchecked(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Like [`load_config`] without semantic validation, for commands that
/// never touch the mint contract.
pub fn load_config_unchecked(path: &Path) -> Result<MintBotConfig, ConfigError> {
    let mut config = if path.exists() {
        read_config(path)?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        MintBotConfig::default()
    };

    apply_overrides(&mut config, |var| std::env::var(var).ok())?;
    Ok(config)
}

/// Apply the legacy environment variables on top of file configuration.
pub fn apply_overrides<F>(config: &mut MintBotConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(address) = env("CONTRACT_ADDRESS") {
        config.contract.address = address;
    }
    if let Some(abi) = env("MINT_FUNCTION_ABI") {
        config.contract.abi = Some(abi);
    }
    if let Some(price) = env("MINT_PRICE") {
        config.contract.mint_price = price;
    }
    if let Some(v) = env("MAX_GAS_PRICE_GWEI") {
        config.gas.max_gas_price_gwei = parse_var("MAX_GAS_PRICE_GWEI", v)?;
    }
    if let Some(v) = env("MAX_PRIORITY_FEE_GWEI") {
        config.gas.max_priority_fee_gwei = parse_var("MAX_PRIORITY_FEE_GWEI", v)?;
    }
    if let Some(v) = env("RETRY_COUNT") {
        config.bot.retry_count = parse_var("RETRY_COUNT", v)?;
    }
    if let Some(v) = env("RETRY_DELAY") {
        config.bot.retry_delay_secs = parse_var("RETRY_DELAY", v)?;
    }
    if let Some(v) = env("CHECK_INTERVAL") {
        config.bot.check_interval_secs = parse_var("CHECK_INTERVAL", v)?;
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [contract]
        address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        abi = "[]"
    "#;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.contract.address, "0x5FbDB2315678afecb367f032d93F642f64180aa3");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[bot\nnetwork = ").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MAX_GAS_PRICE_GWEI", "80"),
            ("RETRY_DELAY", "0.25"),
            ("MINT_PRICE", "0.1"),
        ]
        .into_iter()
        .collect();

        let mut config: MintBotConfig = toml::from_str(MINIMAL).unwrap();
        apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.gas.max_gas_price_gwei, 80);
        assert_eq!(config.bot.retry_delay_secs, 0.25);
        assert_eq!(config.contract.mint_price, "0.1");
        assert_eq!(config.gas.max_priority_fee_gwei, 2);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = MintBotConfig::default();
        let err = apply_overrides(&mut config, |k| {
            (k == "RETRY_COUNT").then(|| "many".to_string())
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for RETRY_COUNT: 'many'");
    }
}
