//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bot.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a minting run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MintBotConfig {
    /// Run settings (network, wallet, pacing).
    pub bot: BotConfig,

    /// Target contract and its interface description.
    pub contract: ContractConfig,

    /// Gas ceilings and gas limit policy.
    pub gas: GasConfig,

    /// Receipt polling.
    pub confirmation: ConfirmationConfig,

    /// RPC transport settings shared by all networks.
    pub rpc: RpcConfig,

    /// Per-network RPC endpoints, keyed by network name.
    pub networks: BTreeMap<String, NetworkConfig>,

    /// Wallet storage and encryption key location.
    pub keystore: KeystoreConfig,

    /// Logging, metrics and transaction journal.
    pub observability: ObservabilityConfig,
}

/// How the bot starts minting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Poll readiness until the mint opens, then mint.
    #[default]
    Monitor,
    /// Start attempting right away.
    Immediate,
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monitor" => Ok(Self::Monitor),
            "immediate" => Ok(Self::Immediate),
            other => Err(format!("unknown mode '{}' (expected monitor or immediate)", other)),
        }
    }
}

/// Run settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// Network name (see `config::networks`).
    pub network: String,

    /// Wallet name in the key store.
    pub wallet: Option<String>,

    /// Start mode.
    pub mode: RunMode,

    /// Number of confirmed successful mints to reach before stopping.
    pub target_count: u32,

    /// Retry ceiling. Advisory unless `enforce_retry_limit` is set.
    pub retry_count: u32,

    /// Stop the run once `retry_count` attempts have been made.
    pub enforce_retry_limit: bool,

    /// Delay after an unsuccessful attempt, in seconds.
    pub retry_delay_secs: f64,

    /// Pre-mint readiness poll interval, in seconds.
    pub check_interval_secs: f64,
}

impl BotConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs.max(0.0))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs_f64(self.check_interval_secs.max(0.0))
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            network: "ethereum".to_string(),
            wallet: None,
            mode: RunMode::Monitor,
            target_count: 1,
            retry_count: 50,
            enforce_retry_limit: false,
            retry_delay_secs: 0.5,
            check_interval_secs: 1.0,
        }
    }
}

/// What to do when none of the readiness queries can be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// Assume the mint is open.
    #[default]
    FailOpen,
    /// Assume the mint is closed and keep polling.
    FailClosed,
}

/// A candidate mint entry point, tried in list order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntryPointConfig {
    /// Canonical function signature, e.g. `mint(uint256)`.
    pub signature: String,

    /// Argument values as strings. `$quantity` expands to `mint_quantity`.
    #[serde(default)]
    pub args: Vec<String>,
}

impl EntryPointConfig {
    pub fn new(signature: &str, args: &[&str]) -> Self {
        Self {
            signature: signature.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Target contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Contract address (hex).
    pub address: String,

    /// Inline JSON ABI.
    pub abi: Option<String>,

    /// Path to a JSON ABI file, used when `abi` is not set.
    pub abi_path: Option<String>,

    /// Mint price per transaction in ether, as a decimal string.
    pub mint_price: String,

    /// Quantity passed to entry points taking a `$quantity` argument.
    pub mint_quantity: u64,

    /// Entry points probed in order; first that encodes wins.
    pub entry_points: Vec<EntryPointConfig>,

    /// Boolean view functions probed in order to decide readiness.
    pub readiness_queries: Vec<String>,

    /// Readiness answer when no query succeeds.
    pub readiness_policy: ReadinessPolicy,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            abi: None,
            abi_path: None,
            mint_price: "0.05".to_string(),
            mint_quantity: 1,
            entry_points: vec![
                EntryPointConfig::new("mint()", &[]),
                EntryPointConfig::new("publicMint()", &[]),
                EntryPointConfig::new("mintPublic()", &[]),
                EntryPointConfig::new("mint(uint256)", &["$quantity"]),
            ],
            readiness_queries: vec![
                "isPublicMintActive()".to_string(),
                "mintActive()".to_string(),
            ],
            readiness_policy: ReadinessPolicy::FailOpen,
        }
    }
}

/// Gas pricing ceilings and gas limit policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Hard cap on gas price / max fee per gas, in gwei.
    pub max_gas_price_gwei: u64,

    /// Hard cap on the priority fee, in gwei.
    pub max_priority_fee_gwei: u64,

    /// Gas limit multiplier in basis points (10000 = estimate as-is).
    pub gas_limit_multiplier_bps: u32,

    /// Gas limit used when estimation fails.
    pub default_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_gas_price_gwei: 100,
            max_priority_fee_gwei: 2,
            gas_limit_multiplier_bps: 12_000,
            default_gas_limit: 200_000,
        }
    }
}

/// Receipt polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Delay between receipt polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Number of polls before the attempt is declared timed out.
    pub max_polls: u32,
}

impl ConfirmationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            max_polls: 30,
        }
    }
}

/// RPC transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// RPC endpoints for one network.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Primary JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,
}

/// Wallet storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Directory holding one JSON file per wallet.
    pub wallets_dir: String,

    /// Environment variable holding the base64 encryption key.
    pub key_env_var: String,

    /// File holding the base64 encryption key when the variable is unset.
    pub key_file: String,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            wallets_dir: "wallets".to_string(),
            key_env_var: "ENCRYPTION_KEY".to_string(),
            key_file: "wallets/.key".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Directory for the daily transaction journal.
    pub journal_dir: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            journal_dir: "logs".to_string(),
        }
    }
}
