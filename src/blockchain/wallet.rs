//! Transaction signing.
//!
//! # Security
//! - Private keys come from the encrypted key store, never from logs or args
//! - Keys are never logged or serialized

use alloy::eips::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{ChainError, ChainResult};

/// Local signer for one wallet.
#[derive(Clone)]
pub struct Signer {
    signer: PrivateKeySigner,
    wallet: EthereumWallet,
}

impl Signer {
    /// Create a signer from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> ChainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Signing(format!("Invalid private key format: {}", e)))?;

        Ok(Self {
            wallet: EthereumWallet::from(signer.clone()),
            signer,
        })
    }

    /// Get the signer's checksummed address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a fully populated request and return the EIP-2718 encoding.
    pub async fn sign(&self, tx: TransactionRequest) -> ChainResult<Bytes> {
        let envelope = tx
            .build(&self.wallet)
            .await
            .map_err(|e| ChainError::Signing(format!("Signing failed: {}", e)))?;
        Ok(Bytes::from(envelope.encoded_2718()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("address", &self.address()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_signer_from_private_key() {
        let signer = Signer::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_signer_with_0x_prefix() {
        let signer = Signer::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = Signer::from_private_key("invalid_key");
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[tokio::test]
    async fn test_sign_eip1559_request() {
        let signer = Signer::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = TransactionRequest::default()
            .with_from(signer.address())
            .with_to(Address::ZERO)
            .with_value(U256::from(1))
            .with_nonce(0)
            .with_chain_id(1)
            .with_gas_limit(21_000)
            .with_max_fee_per_gas(22_000_000_000)
            .with_max_priority_fee_per_gas(2_000_000_000);

        let raw = signer.sign(tx).await.unwrap();
        // EIP-1559 envelopes are prefixed with type byte 0x02
        assert_eq!(raw[0], 0x02);
    }

    #[tokio::test]
    async fn test_sign_incomplete_request_fails() {
        let signer = Signer::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = TransactionRequest::default().with_to(Address::ZERO);
        assert!(signer.sign(tx).await.is_err());
    }
}
