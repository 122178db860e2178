//! EVM NFT mint bot library.

pub mod blockchain;
pub mod config;
pub mod keystore;
pub mod lifecycle;
pub mod minting;
pub mod observability;

pub use config::schema::MintBotConfig;
pub use lifecycle::Shutdown;
pub use minting::{MintBot, RunReport, RunStatus};
