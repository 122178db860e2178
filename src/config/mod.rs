//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! mint-bot.toml (optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → MintBotConfig (validated, immutable for the run)
//!     → networks.rs resolves the RPC endpoint for the selected network
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a run never re-reads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod networks;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_unchecked, ConfigError};
pub use schema::{
    BotConfig, ConfirmationConfig, ContractConfig, EntryPointConfig, GasConfig, KeystoreConfig,
    MintBotConfig, NetworkConfig, ObservabilityConfig, ReadinessPolicy, RpcConfig, RunMode,
};
