//! Target contract: interface description, entry-point probing and
//! readiness queries.
//!
//! Minting contracts name their public entry points differently, so the bot
//! probes an ordered candidate list and takes the first signature the ABI
//! can encode. If a contract defines several candidates the first one in the
//! list is used; there is no check that it is the "right" one.

use std::fs;
use std::path::Path;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use thiserror::Error;

use crate::blockchain::{ChainClient, ChainError};
use crate::config::{ContractConfig, EntryPointConfig, ReadinessPolicy};

/// Placeholder in entry point arguments replaced by the mint quantity.
pub const QUANTITY_PLACEHOLDER: &str = "$quantity";

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid contract address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid contract ABI: {0}")]
    Abi(String),

    #[error("Cannot read ABI file: {0}")]
    AbiFile(#[from] std::io::Error),

    #[error("Function {0} not found in contract ABI")]
    UnknownFunction(String),

    #[error("Cannot encode {signature}: {reason}")]
    Encode { signature: String, reason: String },

    #[error("Cannot decode {signature} output: {reason}")]
    Decode { signature: String, reason: String },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Calldata for the chosen mint entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCall {
    pub signature: String,
    pub calldata: Bytes,
}

/// The contract being minted from.
#[derive(Debug, Clone)]
pub struct MintContract {
    address: Address,
    abi: JsonAbi,
    entry_points: Vec<EntryPointConfig>,
    readiness_queries: Vec<String>,
    readiness_policy: ReadinessPolicy,
}

impl MintContract {
    pub fn new(
        address: Address,
        abi: JsonAbi,
        entry_points: Vec<EntryPointConfig>,
        readiness_queries: Vec<String>,
        readiness_policy: ReadinessPolicy,
    ) -> Self {
        Self {
            address,
            abi,
            entry_points,
            readiness_queries,
            readiness_policy,
        }
    }

    /// Build from configuration: parse the address, load the ABI and expand
    /// `$quantity` arguments.
    pub fn from_config(config: &ContractConfig) -> Result<Self, ContractError> {
        let address: Address = config
            .address
            .trim()
            .parse()
            .map_err(|_| ContractError::InvalidAddress(config.address.clone()))?;

        let abi = match (&config.abi, &config.abi_path) {
            (Some(inline), _) => parse_abi(inline)?,
            (None, Some(path)) => parse_abi(&fs::read_to_string(Path::new(path))?)?,
            (None, None) => return Err(ContractError::Abi("no ABI configured".into())),
        };

        let quantity = config.mint_quantity.to_string();
        let entry_points = config
            .entry_points
            .iter()
            .map(|entry| EntryPointConfig {
                signature: entry.signature.clone(),
                args: entry
                    .args
                    .iter()
                    .map(|a| if a == QUANTITY_PLACEHOLDER { quantity.clone() } else { a.clone() })
                    .collect(),
            })
            .collect();

        Ok(Self::new(
            address,
            abi,
            entry_points,
            config.readiness_queries.clone(),
            config.readiness_policy,
        ))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn readiness_policy(&self) -> ReadinessPolicy {
        self.readiness_policy
    }

    fn function(&self, signature: &str) -> Option<&Function> {
        let wanted = normalize_signature(signature);
        self.abi.functions().find(|f| f.signature() == wanted)
    }

    /// Encode a call to `signature` with string arguments coerced to the
    /// ABI's parameter types.
    pub fn encode_call(&self, signature: &str, args: &[String]) -> Result<Bytes, ContractError> {
        let function = self
            .function(signature)
            .ok_or_else(|| ContractError::UnknownFunction(signature.to_string()))?;
        let encode_err = |reason: String| ContractError::Encode {
            signature: signature.to_string(),
            reason,
        };

        if function.inputs.len() != args.len() {
            return Err(encode_err(format!(
                "expected {} arguments, got {}",
                function.inputs.len(),
                args.len()
            )));
        }

        let values = function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().map_err(|e| encode_err(e.to_string()))?;
                ty.coerce_str(arg).map_err(|e| encode_err(e.to_string()))
            })
            .collect::<Result<Vec<DynSolValue>, _>>()?;

        let data = function
            .abi_encode_input(&values)
            .map_err(|e| encode_err(e.to_string()))?;
        Ok(Bytes::from(data))
    }

    /// First configured entry point that encodes against the ABI.
    pub fn resolve_entry_point(&self) -> Option<ResolvedCall> {
        for entry in &self.entry_points {
            match self.encode_call(&entry.signature, &entry.args) {
                Ok(calldata) => {
                    return Some(ResolvedCall {
                        signature: normalize_signature(&entry.signature),
                        calldata,
                    })
                }
                Err(e) => tracing::trace!(entry_point = %entry.signature, error = %e, "Entry point skipped"),
            }
        }
        None
    }

    /// Decode a single boolean return value of `signature`.
    pub fn decode_bool(&self, signature: &str, output: &[u8]) -> Result<bool, ContractError> {
        let function = self
            .function(signature)
            .ok_or_else(|| ContractError::UnknownFunction(signature.to_string()))?;
        let decode_err = |reason: String| ContractError::Decode {
            signature: signature.to_string(),
            reason,
        };

        let values = function
            .abi_decode_output(output)
            .map_err(|e| decode_err(e.to_string()))?;
        match values.as_slice() {
            [value] => value
                .as_bool()
                .ok_or_else(|| decode_err("return value is not a bool".into())),
            _ => Err(decode_err(format!("expected 1 return value, got {}", values.len()))),
        }
    }

    /// Run one readiness query against the chain.
    pub async fn query_flag(&self, client: &dyn ChainClient, signature: &str) -> Result<bool, ContractError> {
        let calldata = self.encode_call(signature, &[])?;
        let tx = TransactionRequest::default()
            .with_to(self.address)
            .with_input(calldata);
        let output = client.call(tx).await?;
        self.decode_bool(signature, &output)
    }

    /// Whether the contract currently accepts mints.
    ///
    /// The first readiness query that answers decides. When none can be
    /// answered the configured policy applies: fail-open reports ready.
    pub async fn check_readiness(&self, client: &dyn ChainClient) -> bool {
        for query in &self.readiness_queries {
            match self.query_flag(client, query).await {
                Ok(active) => {
                    tracing::debug!(query = %query, active, "Readiness query answered");
                    return active;
                }
                Err(e) => tracing::debug!(query = %query, error = %e, "Readiness query unavailable"),
            }
        }

        let assumed = self.readiness_policy == ReadinessPolicy::FailOpen;
        tracing::debug!(policy = ?self.readiness_policy, assumed, "No readiness query answered");
        assumed
    }
}

/// Accept a bare ABI array or a build artifact with an `abi` field.
pub fn parse_abi(json: &str) -> Result<JsonAbi, ContractError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ContractError::Abi(e.to_string()))?;
    let abi_value = match value {
        serde_json::Value::Object(mut artifact) => artifact
            .remove("abi")
            .ok_or_else(|| ContractError::Abi("object has no 'abi' field".into()))?,
        other => other,
    };
    serde_json::from_value(abi_value).map_err(|e| ContractError::Abi(e.to_string()))
}

fn normalize_signature(signature: &str) -> String {
    signature.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blockchain::client::MockChainClient;
    use alloy::primitives::U256;
    use alloy::sol_types::SolValue;

    pub(crate) const ERC721_MINT_ABI: &str = r#"[
        {"inputs":[],"name":"publicMint","outputs":[],"stateMutability":"payable","type":"function"},
        {"inputs":[{"internalType":"uint256","name":"quantity","type":"uint256"}],"name":"mint","outputs":[],"stateMutability":"payable","type":"function"},
        {"inputs":[],"name":"mintActive","outputs":[{"internalType":"bool","name":"","type":"bool"}],"stateMutability":"view","type":"function"}
    ]"#;

    pub(crate) fn contract_with_abi(abi: &str) -> MintContract {
        let config = ContractConfig {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
            abi: Some(abi.into()),
            mint_quantity: 3,
            ..ContractConfig::default()
        };
        MintContract::from_config(&config).unwrap()
    }

    #[test]
    fn test_probe_picks_first_listed_match() {
        let contract = contract_with_abi(ERC721_MINT_ABI);
        let call = contract.resolve_entry_point().unwrap();
        assert_eq!(call.signature, "publicMint()");
        assert_eq!(call.calldata.len(), 4);

        // Deterministic across calls
        assert_eq!(contract.resolve_entry_point(), Some(call));
    }

    #[test]
    fn test_probe_quantity_argument() {
        let contract = contract_with_abi(
            r#"[{"inputs":[{"name":"quantity","type":"uint256"}],"name":"mint","outputs":[],"stateMutability":"payable","type":"function"}]"#,
        );
        let call = contract.resolve_entry_point().unwrap();
        assert_eq!(call.signature, "mint(uint256)");
        assert_eq!(&call.calldata[4..], U256::from(3).abi_encode().as_slice());
    }

    #[test]
    fn test_probe_no_match() {
        let contract = contract_with_abi(
            r#"[{"inputs":[],"name":"claim","outputs":[],"stateMutability":"payable","type":"function"}]"#,
        );
        assert!(contract.resolve_entry_point().is_none());
    }

    #[test]
    fn test_encode_rejects_bad_arguments() {
        let contract = contract_with_abi(ERC721_MINT_ABI);
        assert!(matches!(
            contract.encode_call("mint(uint256)", &["lots".into()]),
            Err(ContractError::Encode { .. })
        ));
        assert!(matches!(
            contract.encode_call("mint(uint256)", &[]),
            Err(ContractError::Encode { .. })
        ));
        assert!(matches!(
            contract.encode_call("burn()", &[]),
            Err(ContractError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_parse_abi_artifact() {
        let artifact = format!(r#"{{"contractName":"Drop","abi":{}}}"#, ERC721_MINT_ABI);
        assert_eq!(parse_abi(&artifact).unwrap().functions().count(), 3);
        assert!(parse_abi("{}").is_err());
        assert!(parse_abi("not json").is_err());
    }

    #[test]
    fn test_decode_bool() {
        let contract = contract_with_abi(ERC721_MINT_ABI);
        assert!(contract.decode_bool("mintActive()", &true.abi_encode()).unwrap());
        assert!(!contract.decode_bool("mintActive()", &false.abi_encode()).unwrap());
        assert!(contract.decode_bool("mintActive()", &[]).is_err());
    }

    #[tokio::test]
    async fn test_readiness_uses_first_answering_query() {
        let contract = contract_with_abi(ERC721_MINT_ABI);
        let mut client = MockChainClient::new();
        // isPublicMintActive() is not in the ABI, so only mintActive() is called
        client
            .expect_call()
            .times(1)
            .returning(|_| Ok(Bytes::from(false.abi_encode())));

        assert!(!contract.check_readiness(&client).await);
    }

    #[tokio::test]
    async fn test_readiness_fail_open_when_unanswerable() {
        let contract = contract_with_abi(ERC721_MINT_ABI);
        let mut client = MockChainClient::new();
        client
            .expect_call()
            .returning(|_| Err(ChainError::Rpc("execution reverted".into())));

        for _ in 0..3 {
            assert!(contract.check_readiness(&client).await);
        }
    }

    #[tokio::test]
    async fn test_readiness_fail_closed_when_unanswerable() {
        let config = ContractConfig {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
            abi: Some("[]".into()),
            readiness_policy: ReadinessPolicy::FailClosed,
            ..ContractConfig::default()
        };
        let contract = MintContract::from_config(&config).unwrap();
        let client = MockChainClient::new();

        assert!(!contract.check_readiness(&client).await);
    }
}
