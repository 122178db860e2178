//! Key store context: wallet import, lookup, unlock and statistics.

use chrono::Utc;

use crate::blockchain::Signer;
use crate::keystore::cipher::KeyCipher;
use crate::keystore::record::WalletRecord;
use crate::keystore::store::{validate_name, KvStore};
use crate::keystore::{KeyStoreError, KeyStoreResult};

/// Encrypted wallet storage bound to one symmetric key.
#[derive(Debug)]
pub struct KeyStore<S> {
    cipher: KeyCipher,
    store: S,
}

impl<S: KvStore> KeyStore<S> {
    pub fn new(cipher: KeyCipher, store: S) -> Self {
        Self { cipher, store }
    }

    /// Validate, encrypt and store a private key under `name`.
    ///
    /// If `expected_address` is given it must match the key's address.
    pub fn import_wallet(
        &self,
        name: &str,
        private_key: &str,
        expected_address: Option<&str>,
    ) -> KeyStoreResult<WalletRecord> {
        validate_name(name)?;
        if self.store.get(name)?.is_some() {
            return Err(KeyStoreError::AlreadyExists(name.to_string()));
        }

        let signer = Signer::from_private_key(private_key)
            .map_err(|e| KeyStoreError::InvalidPrivateKey(e.to_string()))?;
        let address = signer.address().to_string();

        if let Some(expected) = expected_address {
            if !expected.trim().eq_ignore_ascii_case(&address) {
                return Err(KeyStoreError::AddressMismatch {
                    expected: expected.trim().to_string(),
                    actual: address,
                });
            }
        }

        let encrypted = self.cipher.encrypt(private_key.trim())?;
        let record = WalletRecord::new(name, address, encrypted, Utc::now());
        self.save(&record)?;

        tracing::info!(wallet = %name, address = %record.address, "Wallet added");
        Ok(record)
    }

    pub fn get_wallet(&self, name: &str) -> KeyStoreResult<WalletRecord> {
        let bytes = self
            .store
            .get(name)?
            .ok_or_else(|| KeyStoreError::NotFound(name.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All wallets, sorted by name.
    pub fn list_wallets(&self) -> KeyStoreResult<Vec<WalletRecord>> {
        self.store
            .list()?
            .iter()
            .map(|name| self.get_wallet(name))
            .collect()
    }

    pub fn remove_wallet(&self, name: &str) -> KeyStoreResult<()> {
        if self.store.delete(name)? {
            tracing::info!(wallet = %name, "Wallet removed");
            Ok(())
        } else {
            Err(KeyStoreError::NotFound(name.to_string()))
        }
    }

    /// Decrypt a wallet's key and check it still derives the stored address.
    pub fn unlock(&self, name: &str) -> KeyStoreResult<Signer> {
        let record = self.get_wallet(name)?;
        let private_key = self.cipher.decrypt(&record.private_key_encrypted)?;

        let signer = Signer::from_private_key(&private_key)
            .map_err(|e| KeyStoreError::Decryption(e.to_string()))?;
        if !signer.address().to_string().eq_ignore_ascii_case(&record.address) {
            return Err(KeyStoreError::Decryption(format!(
                "decrypted key belongs to {}, record says {}",
                signer.address(),
                record.address
            )));
        }

        Ok(signer)
    }

    /// Update usage statistics after a mint attempt.
    pub fn record_attempt(&self, name: &str, success: bool, gas_spent: f64) -> KeyStoreResult<WalletRecord> {
        let mut record = self.get_wallet(name)?;
        record.record_attempt(success, gas_spent, Utc::now());
        self.save(&record)?;
        Ok(record)
    }

    fn save(&self, record: &WalletRecord) -> KeyStoreResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        self.store.put(&record.name, &json)
    }
}
