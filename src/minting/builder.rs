//! Mint transaction assembly.

use alloy::primitives::{Address, U256};
use thiserror::Error;

use crate::blockchain::{ChainClient, ChainError, TransactionCandidate};
use crate::config::GasConfig;
use crate::minting::contract::MintContract;
use crate::minting::gas::{quote_gas, GasCaps};

/// Why a candidate transaction could not be assembled.
#[derive(Debug, Error)]
pub enum BuildFailure {
    #[error("Failed to fetch {what}: {source}")]
    Chain {
        what: &'static str,
        #[source]
        source: ChainError,
    },

    #[error("No mint entry point in the contract ABI matches the configured candidates")]
    NoEntryPoint,
}

/// Assembles one candidate transaction per attempt.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    caps: GasCaps,
    gas_limit_multiplier_bps: u32,
    default_gas_limit: u64,
}

impl TxBuilder {
    pub fn new(config: &GasConfig) -> Self {
        Self {
            caps: GasCaps::from(config),
            gas_limit_multiplier_bps: config.gas_limit_multiplier_bps,
            default_gas_limit: config.default_gas_limit,
        }
    }

    /// Build a mint transaction from `sender` paying `value` wei.
    ///
    /// Nonce and chain id are fetched fresh. A failed gas estimate falls back
    /// to the default gas limit; a successful one gets the safety margin.
    pub async fn build(
        &self,
        client: &dyn ChainClient,
        sender: Address,
        contract: &MintContract,
        value: U256,
    ) -> Result<TransactionCandidate, BuildFailure> {
        let nonce = client
            .nonce(sender)
            .await
            .map_err(|source| BuildFailure::Chain { what: "nonce", source })?;
        let chain_id = client
            .chain_id()
            .await
            .map_err(|source| BuildFailure::Chain { what: "chain id", source })?;
        let gas = quote_gas(client, &self.caps)
            .await
            .map_err(|source| BuildFailure::Chain { what: "gas price", source })?;

        let call = contract.resolve_entry_point().ok_or(BuildFailure::NoEntryPoint)?;

        let mut candidate = TransactionCandidate {
            from: sender,
            to: contract.address(),
            value,
            nonce,
            chain_id,
            gas_limit: self.default_gas_limit,
            gas,
            calldata: call.calldata,
            entry_point: call.signature,
        };

        match client.estimate_gas(candidate.to_request()).await {
            Ok(estimate) => candidate.gas_limit = self.apply_margin(estimate),
            Err(e) => tracing::warn!(
                error = %e,
                default_gas_limit = self.default_gas_limit,
                "Gas estimation failed, using default limit"
            ),
        }

        tracing::debug!(
            nonce,
            chain_id,
            gas_limit = candidate.gas_limit,
            entry_point = %candidate.entry_point,
            "Mint transaction built"
        );
        Ok(candidate)
    }

    fn apply_margin(&self, estimate: u64) -> u64 {
        let scaled = u128::from(estimate) * u128::from(self.gas_limit_multiplier_bps) / 10_000;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::client::MockChainClient;
    use crate::blockchain::GasParams;
    use crate::minting::contract::tests::{contract_with_abi, ERC721_MINT_ABI};
    use crate::minting::gas::GWEI;

    fn builder() -> TxBuilder {
        TxBuilder::new(&GasConfig::default())
    }

    fn healthy_chain() -> MockChainClient {
        let mut client = MockChainClient::new();
        client.expect_nonce().returning(|_| Ok(4));
        client.expect_chain_id().returning(|| Ok(1));
        client.expect_base_fee().returning(|| Ok(Some(20 * GWEI)));
        client
    }

    #[tokio::test]
    async fn test_build_applies_gas_margin() {
        let mut client = healthy_chain();
        client.expect_estimate_gas().returning(|_| Ok(100_000));
        let contract = contract_with_abi(ERC721_MINT_ABI);
        let sender = Address::repeat_byte(0xaa);

        let tx = builder()
            .build(&client, sender, &contract, U256::from(5))
            .await
            .unwrap();

        assert_eq!(tx.gas_limit, 120_000);
        assert_eq!(tx.nonce, 4);
        assert_eq!(tx.chain_id, 1);
        assert_eq!(tx.from, sender);
        assert_eq!(tx.to, contract.address());
        assert_eq!(tx.value, U256::from(5));
        assert_eq!(tx.entry_point, "publicMint()");
        assert_eq!(
            tx.gas,
            GasParams::Eip1559 {
                max_fee_per_gas: 22 * GWEI,
                max_priority_fee_per_gas: 2 * GWEI,
            }
        );
    }

    #[tokio::test]
    async fn test_build_defaults_gas_limit_when_estimate_fails() {
        let mut client = healthy_chain();
        client
            .expect_estimate_gas()
            .returning(|_| Err(ChainError::Rpc("execution reverted".into())));
        let contract = contract_with_abi(ERC721_MINT_ABI);

        let tx = builder()
            .build(&client, Address::ZERO, &contract, U256::ZERO)
            .await
            .unwrap();
        assert_eq!(tx.gas_limit, 200_000);
    }

    #[tokio::test]
    async fn test_build_fails_without_entry_point() {
        let mut client = healthy_chain();
        client.expect_estimate_gas().never();
        let contract = contract_with_abi("[]");

        let err = builder()
            .build(&client, Address::ZERO, &contract, U256::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildFailure::NoEntryPoint));
    }

    #[tokio::test]
    async fn test_build_fails_when_nonce_unavailable() {
        let mut client = MockChainClient::new();
        client
            .expect_nonce()
            .returning(|_| Err(ChainError::Rpc("connection refused".into())));
        let contract = contract_with_abi(ERC721_MINT_ABI);

        let err = builder()
            .build(&client, Address::ZERO, &contract, U256::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch nonce"));
    }

    #[test]
    fn test_margin_rounding() {
        assert_eq!(builder().apply_margin(21_000), 25_200);
        assert_eq!(builder().apply_margin(0), 0);
    }
}
