//! Ethereum JSON-RPC client
//!
//! Thin wrapper around an execution client's JSON-RPC interface. Only the
//! read-only methods the audit needs are exposed; every read targets the
//! current chain head.

use crate::error::{LedgerError, Result};
use crate::types::Address;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// RPC client configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URL (e.g., "http://127.0.0.1:8545")
    pub url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl RpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-RPC client for an Ethereum endpoint
pub struct EthRpcClient {
    client: Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl EthRpcClient {
    /// Create a new RPC client
    pub fn new(config: RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Make an RPC call and return its `result` member
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed)
        });

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::transport(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::transport(format!(
                "{} request failed with status: {}",
                method, status
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::decode(format!("failed to parse {} response: {}", method, e)))?;

        if let Some(error) = json.get("error") {
            if !error.is_null() {
                return Err(LedgerError::transport(format!("RPC error in {}: {}", method, error)));
            }
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| LedgerError::decode(format!("{} response missing result", method)))
    }

    /// Read-only contract call against the latest block
    pub async fn eth_call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": format!("0x{}", hex::encode(to.as_bytes())),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);
        let result = self.call("eth_call", params).await?;
        decode_hex_value(&result)
    }

    /// Get chain id
    pub async fn chain_id(&self) -> Result<u64> {
        let result = self.call("eth_chainId", serde_json::json!([])).await?;
        decode_quantity(&result)
    }

    /// Get latest block number
    pub async fn block_number(&self) -> Result<u64> {
        let result = self.call("eth_blockNumber", serde_json::json!([])).await?;
        decode_quantity(&result)
    }
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| LedgerError::decode(format!("expected hex string, got {}", value)))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| LedgerError::decode(format!("invalid hex data: {}", e)))
}

fn decode_quantity(value: &Value) -> Result<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| LedgerError::decode(format!("expected quantity, got {}", value)))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|e| LedgerError::decode(format!("invalid quantity {}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_decode_hex_value() {
        assert_eq!(decode_hex_value(&serde_json::json!("0x0102")).unwrap(), vec![1, 2]);
        assert_eq!(decode_hex_value(&serde_json::json!("0x")).unwrap(), Vec::<u8>::new());
        assert!(decode_hex_value(&serde_json::json!("0xzz")).is_err());
        assert!(decode_hex_value(&serde_json::json!(5)).is_err());
    }

    #[test]
    fn test_decode_quantity() {
        assert_eq!(decode_quantity(&serde_json::json!("0x5")).unwrap(), 5);
        assert!(decode_quantity(&serde_json::json!("0xnope")).is_err());
    }

    #[tokio::test]
    async fn test_rpc_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "execution reverted"}
            })))
            .mount(&server)
            .await;

        let client = EthRpcClient::new(RpcConfig::new(server.uri())).unwrap();
        let err = client.eth_call(&Address::ZERO, &[0, 1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }

    #[tokio::test]
    async fn test_http_status_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = EthRpcClient::new(RpcConfig::new(server.uri())).unwrap();
        assert!(matches!(client.block_number().await, Err(LedgerError::Transport(_))));
    }

    #[tokio::test]
    async fn test_chain_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"method": "eth_chainId"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x5"
            })))
            .mount(&server)
            .await;

        let client = EthRpcClient::new(RpcConfig::new(server.uri())).unwrap();
        assert_eq!(client.chain_id().await.unwrap(), 5);
    }
}
