//! AES-256-GCM encryption of private keys.
//!
//! Ciphertext layout: `base64url(nonce[12] || ciphertext || tag[16])`.

use std::fs;
use std::io::Write;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;

use crate::keystore::{KeyStoreError, KeyStoreResult};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Symmetric cipher bound to one process-wide key.
#[derive(Clone)]
pub struct KeyCipher {
    key: [u8; KEY_LEN],
    cipher: Aes256Gcm,
}

impl KeyCipher {
    fn from_key(key: [u8; KEY_LEN]) -> KeyStoreResult<Self> {
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| KeyStoreError::InvalidKeyMaterial(e.to_string()))?;
        Ok(Self { key, cipher })
    }

    /// Generate a fresh random key.
    pub fn generate() -> KeyStoreResult<Self> {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self::from_key(key)
    }

    /// Parse a base64 (URL-safe) encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> KeyStoreResult<Self> {
        let bytes = URL_SAFE
            .decode(encoded.trim())
            .map_err(|e| KeyStoreError::InvalidKeyMaterial(e.to_string()))?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            KeyStoreError::InvalidKeyMaterial(format!("expected {} bytes, got {}", KEY_LEN, b.len()))
        })?;
        Self::from_key(key)
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.key)
    }

    pub fn encrypt(&self, plaintext: &str) -> KeyStoreResult<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| KeyStoreError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(URL_SAFE.encode(blob))
    }

    pub fn decrypt(&self, encoded: &str) -> KeyStoreResult<String> {
        let blob = URL_SAFE
            .decode(encoded.trim())
            .map_err(|e| KeyStoreError::Decryption(format!("ciphertext is not base64: {}", e)))?;
        if blob.len() <= NONCE_LEN {
            return Err(KeyStoreError::Decryption("ciphertext too short".into()));
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| KeyStoreError::Decryption("wrong key or corrupted ciphertext".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| KeyStoreError::Decryption("plaintext is not UTF-8".into()))
    }
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyCipher(<redacted>)")
    }
}

/// Where the encryption key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    KeyFile,
    Generated,
}

/// Load the encryption key from `env_value`, then `key_file`; otherwise
/// generate one and persist it to `key_file`.
pub fn load_or_generate_key(
    env_value: Option<String>,
    key_file: &Path,
) -> KeyStoreResult<(KeyCipher, KeySource)> {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Ok((KeyCipher::from_base64(&value)?, KeySource::Environment));
    }

    if key_file.exists() {
        let encoded = fs::read_to_string(key_file)?;
        return Ok((KeyCipher::from_base64(&encoded)?, KeySource::KeyFile));
    }

    let cipher = KeyCipher::generate()?;
    if let Some(parent) = key_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_key_file(key_file, &cipher.to_base64())?;
    tracing::warn!(
        path = %key_file.display(),
        "Generated new encryption key; back it up, wallets cannot be decrypted without it"
    );

    Ok((cipher, KeySource::Generated))
}

/// Create the key file readable by the owner only.
fn write_key_file(path: &Path, encoded: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(encoded.as_bytes())
}
