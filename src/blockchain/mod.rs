//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Key store (decrypted private key)
//!     → wallet.rs (signer, EIP-2718 encoding)
//!     → client.rs (RPC adapter with timeouts and failover)
//!     → transaction.rs (candidate transaction, gas parameters)
//!
//! gas_oracle.rs: Etherscan gas tracker for the `gas` command
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - RPC failures surface as `ChainError`, never a panic

pub mod client;
pub mod gas_oracle;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, RpcChainClient};
pub use gas_oracle::{GasOracle, GasOracleQuote};
pub use transaction::{GasParams, TransactionCandidate};
pub use types::{ChainError, ChainResult, MintReceipt};
pub use wallet::Signer;
