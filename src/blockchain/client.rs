//! Blockchain RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Define the `ChainClient` contract the minting core depends on
//! - Connect to one or more JSON-RPC endpoints per network
//! - Query chain state (nonce, fees, receipts) and broadcast raw transactions
//! - Handle timeouts and network errors gracefully

use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::blockchain::types::{ChainError, ChainResult, MintReceipt};

/// Remote chain operations used by the minting core.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Pending transaction count for `address`.
    async fn nonce(&self, address: Address) -> ChainResult<u64>;

    async fn chain_id(&self) -> ChainResult<u64>;

    /// Base fee of the latest block, `None` on pre-London chains.
    async fn base_fee(&self) -> ChainResult<Option<u128>>;

    /// Legacy gas price in wei.
    async fn gas_price(&self) -> ChainResult<u128>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> ChainResult<u64>;

    /// Read-only `eth_call`.
    async fn call(&self, tx: TransactionRequest) -> ChainResult<Bytes>;

    /// Broadcast an EIP-2718 encoded signed transaction.
    async fn send_raw(&self, raw: Bytes) -> ChainResult<TxHash>;

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<MintReceipt>>;
}

/// Try each provider in order, with a timeout per call.
macro_rules! with_failover {
    ($self:ident, $what:literal, |$p:ident| $call:expr) => {{
        let mut last_error = String::new();
        for (i, $p) in $self.providers.iter().enumerate() {
            match timeout($self.timeout_duration, $call).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, call = $what, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, call = $what, "RPC timeout, trying next provider");
                    last_error = format!("timeout after {}s", $self.timeout_duration.as_secs());
                }
            }
        }
        Err(ChainError::Rpc(format!(
            "All RPC providers failed to {}: {}",
            $what, last_error
        )))
    }};
}

/// Alloy-backed `ChainClient` with failover support.
#[derive(Clone)]
pub struct RpcChainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    rpc_url: String,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcChainClient {
    /// Create a new client for `rpc_url` and its failovers.
    ///
    /// Only the primary URL must parse; invalid failover URLs are skipped.
    pub fn new(rpc_url: &str, failover_urls: &[String], timeout_secs: u64) -> ChainResult<Self> {
        let primary: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            ChainError::InvalidEndpoint {
                url: rpc_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut providers = vec![ProviderBuilder::new().connect_http(primary).erased()];
        for url_str in failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(ProviderBuilder::new().connect_http(url).erased()),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        Ok(Self {
            providers,
            rpc_url: rpc_url.to_string(),
            timeout_duration: Duration::from_secs(timeout_secs),
        })
    }

    /// Create a client and check the endpoint serves `expected_chain_id`.
    ///
    /// A failed check is logged, not returned: the endpoint may come up later.
    pub async fn connect(
        rpc_url: &str,
        failover_urls: &[String],
        timeout_secs: u64,
        expected_chain_id: Option<u64>,
    ) -> ChainResult<Self> {
        let client = Self::new(rpc_url, failover_urls, timeout_secs)?;

        if let Some(expected) = expected_chain_id {
            match client.verify_chain_id(expected).await {
                Ok(()) => tracing::info!(rpc_url = %rpc_url, chain_id = expected, "Chain client initialized"),
                Err(e) => tracing::warn!(
                    error = %e,
                    "Chain client initialized but chain verification failed"
                ),
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches `expected`.
    pub async fn verify_chain_id(&self, expected: u64) -> ChainResult<()> {
        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(ChainError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn nonce(&self, address: Address) -> ChainResult<u64> {
        with_failover!(self, "get transaction count", |p| p.get_transaction_count(address).pending())
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        with_failover!(self, "get chain id", |p| p.get_chain_id())
    }

    async fn base_fee(&self) -> ChainResult<Option<u128>> {
        with_failover!(self, "get latest block", |p| async move {
            p.get_block_by_number(BlockNumberOrTag::Latest)
                .await
                .map(|block| block.and_then(|b| b.header.base_fee_per_gas).map(u128::from))
        })
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        with_failover!(self, "get gas price", |p| p.get_gas_price())
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> ChainResult<u64> {
        with_failover!(self, "estimate gas", |p| p.estimate_gas(tx.clone()))
    }

    async fn call(&self, tx: TransactionRequest) -> ChainResult<Bytes> {
        with_failover!(self, "call contract", |p| p.call(tx.clone()))
    }

    async fn send_raw(&self, raw: Bytes) -> ChainResult<TxHash> {
        with_failover!(self, "send raw transaction", |p| async {
            p.send_raw_transaction(&raw)
                .await
                .map(|pending| *pending.tx_hash())
        })
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<MintReceipt>> {
        with_failover!(self, "get receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await.map(|receipt| {
                receipt.map(|r| MintReceipt {
                    tx_hash: r.transaction_hash,
                    success: r.status(),
                    gas_used: r.gas_used,
                    effective_gas_price: r.effective_gas_price,
                    block_number: r.block_number,
                })
            })
        })
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
