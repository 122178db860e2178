//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolValue;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use mint_bot::blockchain::{ChainClient, ChainError, ChainResult, MintReceipt};
use mint_bot::config::{ContractConfig, MintBotConfig};
use mint_bot::keystore::{KeyCipher, KeyStore, KvStore};

pub const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const GWEI: u128 = 1_000_000_000;

pub const MINT_ABI: &str = r#"[
    {"type":"function","name":"publicMint","inputs":[],"outputs":[],"stateMutability":"payable"},
    {"type":"function","name":"mintActive","inputs":[],"outputs":[{"name":"","type":"bool"}],"stateMutability":"view"}
]"#;

/// Config with millisecond delays so runs finish quickly.
pub fn fast_config() -> MintBotConfig {
    let mut config = MintBotConfig::default();
    config.bot.wallet = Some("main".into());
    config.bot.retry_delay_secs = 0.001;
    config.bot.check_interval_secs = 0.001;
    config.confirmation.poll_interval_ms = 1;
    config.confirmation.max_polls = 3;
    config.contract = ContractConfig {
        address: CONTRACT_ADDRESS.into(),
        abi: Some(MINT_ABI.into()),
        ..ContractConfig::default()
    };
    config
}

/// Key store holding the test key under `main`.
pub fn key_store_with_wallet<S: KvStore>(cipher: KeyCipher, store: S) -> KeyStore<S> {
    let key_store = KeyStore::new(cipher, store);
    key_store
        .import_wallet("main", TEST_PRIVATE_KEY, Some(TEST_ADDRESS))
        .unwrap();
    key_store
}

type ReadinessFn = dyn Fn(u32) -> Option<bool> + Send + Sync;
type ReceiptFn = dyn Fn(u32, u32) -> Option<bool> + Send + Sync;

/// In-process chain driven by closures.
///
/// `readiness(n)` answers the n-th readiness query (`None` = call reverts).
/// `receipt(tx, poll)` answers poll number `poll` for the `tx`-th sent
/// transaction, both 1-based (`None` = still pending).
pub struct ScriptedChain {
    readiness: Box<ReadinessFn>,
    receipt: Box<ReceiptFn>,
    base_fee: Option<u128>,
    pub readiness_calls: AtomicU32,
    pub sent: AtomicU32,
    polls: Mutex<HashMap<TxHash, (u32, u32)>>,
}

impl ScriptedChain {
    pub fn new<R, C>(readiness: R, receipt: C) -> Arc<Self>
    where
        R: Fn(u32) -> Option<bool> + Send + Sync + 'static,
        C: Fn(u32, u32) -> Option<bool> + Send + Sync + 'static,
    {
        Arc::new(Self {
            readiness: Box::new(readiness),
            receipt: Box::new(receipt),
            base_fee: Some(20 * GWEI),
            readiness_calls: AtomicU32::new(0),
            sent: AtomicU32::new(0),
            polls: Mutex::new(HashMap::new()),
        })
    }

    /// Mint open, every transaction confirmed on the first poll.
    pub fn always_mints() -> Arc<Self> {
        Self::new(|_| Some(true), |_, _| Some(true))
    }

    pub fn sent_count(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn readiness_count(&self) -> u32 {
        self.readiness_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn nonce(&self, _address: Address) -> ChainResult<u64> {
        Ok(u64::from(self.sent_count()))
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(31337)
    }

    async fn base_fee(&self) -> ChainResult<Option<u128>> {
        Ok(self.base_fee)
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        Ok(30 * GWEI)
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> ChainResult<u64> {
        Ok(90_000)
    }

    async fn call(&self, _tx: TransactionRequest) -> ChainResult<Bytes> {
        let n = self.readiness_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match (self.readiness)(n) {
            Some(flag) => Ok(flag.abi_encode().into()),
            None => Err(ChainError::Rpc("execution reverted".into())),
        }
    }

    async fn send_raw(&self, raw: Bytes) -> ChainResult<TxHash> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = keccak256(&raw);
        self.polls.lock().unwrap().insert(hash, (n, 0));
        Ok(hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<MintReceipt>> {
        let (tx, poll) = {
            let mut polls = self.polls.lock().unwrap();
            let Some(entry) = polls.get_mut(&tx_hash) else {
                return Ok(None);
            };
            entry.1 += 1;
            *entry
        };

        Ok((self.receipt)(tx, poll).map(|success| MintReceipt {
            tx_hash,
            success,
            gas_used: 85_000,
            effective_gas_price: 22 * GWEI,
            block_number: Some(u64::from(tx)),
        }))
    }
}

/// Start a JSON-RPC backend on an ephemeral port.
///
/// `handler(method, params)` returns the `result` value, or an error message
/// sent back as a JSON-RPC error.
pub async fn start_rpc_backend<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_http_body(&mut socket).await else {
                            return;
                        };
                        let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                        let method = request["method"].as_str().unwrap_or_default();
                        let response = match handler(method, &request["params"]) {
                            Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
                            Err(message) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "error": {"code": -32000, "message": message}
                            }),
                        };
                        let payload = response.to_string();
                        let http = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            payload.len(),
                            payload
                        );
                        let _ = socket.write_all(http.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn dead_endpoint() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_http_body(socket: &mut tokio::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(buf[header_end..].to_vec())
}
