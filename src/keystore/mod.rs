//! Wallet key store.
//!
//! # Data Flow
//! ```text
//! ENCRYPTION_KEY / key file
//!     → cipher.rs (AES-256-GCM key, base64 ciphertext)
//!     → store.rs (named blobs: flat files or memory)
//!     → record.rs (wallet record + usage counters)
//!     → manager.rs (KeyStore context: import, unlock, stats)
//! ```
//!
//! # Security Constraints
//! - Plaintext private keys exist only in memory, inside a `Signer`
//! - The symmetric key is loaded once per process and never mutated

pub mod cipher;
pub mod manager;
pub mod record;
pub mod store;

use thiserror::Error;

pub use cipher::{load_or_generate_key, KeyCipher, KeySource};
pub use manager::KeyStore;
pub use record::WalletRecord;
pub use store::{FileStore, KvStore, MemoryStore};

/// Errors raised by the key store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wallet record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid encryption key: {0}")]
    InvalidKeyMaterial(String),

    #[error("Encryption failed")]
    Encryption,

    /// Wrong symmetric key, tampered ciphertext or a stored key that no
    /// longer matches its address.
    #[error("Failed to decrypt private key: {0}")]
    Decryption(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Address {expected} doesn't match private key (derived {actual})")]
    AddressMismatch { expected: String, actual: String },

    #[error("Wallet '{0}' not found")]
    NotFound(String),

    #[error("Wallet '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid wallet name '{0}'")]
    InvalidName(String),
}

pub type KeyStoreResult<T> = Result<T, KeyStoreError>;
