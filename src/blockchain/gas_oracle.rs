//! Etherscan gas tracker, used by the `gas` command alongside RPC fee data.

use std::time::Duration;

use serde::Deserialize;

use crate::blockchain::types::{ChainError, ChainResult};

pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Suggested prices in gwei.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GasOracleQuote {
    #[serde(rename = "SafeGasPrice")]
    pub safe: String,
    #[serde(rename = "ProposeGasPrice")]
    pub propose: String,
    #[serde(rename = "FastGasPrice")]
    pub fast: String,
    #[serde(rename = "suggestBaseFee", default)]
    pub suggested_base_fee: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OracleResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

/// Client for the Etherscan `gastracker/gasoracle` endpoint.
#[derive(Debug, Clone)]
pub struct GasOracle {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GasOracle {
    pub fn new(api_key: impl Into<String>) -> ChainResult<Self> {
        Self::with_base_url(ETHERSCAN_API_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChainError::Rpc(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub async fn fetch(&self, chain_id: u64) -> ChainResult<GasOracleQuote> {
        let chain_id = chain_id.to_string();
        let body = self
            .http
            .get(&self.base_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "gastracker"),
                ("action", "gasoracle"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ChainError::Rpc(format!("gas oracle request failed: {}", e)))?
            .text()
            .await
            .map_err(|e| ChainError::Rpc(format!("gas oracle response unreadable: {}", e)))?;

        parse_oracle_response(&body)
    }
}

/// Parse an Etherscan response body. A `status` other than `"1"` is an error
/// carrying the API's message.
pub fn parse_oracle_response(body: &str) -> ChainResult<GasOracleQuote> {
    let response: OracleResponse =
        serde_json::from_str(body).map_err(|e| ChainError::Rpc(format!("gas oracle response invalid: {}", e)))?;

    if response.status != "1" {
        let detail = response.result.as_str().unwrap_or_default();
        return Err(ChainError::Rpc(format!(
            "gas oracle error: {} {}",
            response.message, detail
        )));
    }

    serde_json::from_value(response.result)
        .map_err(|e| ChainError::Rpc(format!("gas oracle result invalid: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "status": "1",
            "message": "OK",
            "result": {
                "LastBlock": "19876543",
                "SafeGasPrice": "11",
                "ProposeGasPrice": "12",
                "FastGasPrice": "15",
                "suggestBaseFee": "10.84",
                "gasUsedRatio": "0.4,0.6"
            }
        }"#;
        let quote = parse_oracle_response(body).unwrap();
        assert_eq!(quote.safe, "11");
        assert_eq!(quote.propose, "12");
        assert_eq!(quote.fast, "15");
        assert_eq!(quote.suggested_base_fee.as_deref(), Some("10.84"));
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        let err = parse_oracle_response(body).unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_oracle_response("<html>").is_err());
    }
}
