//! Ethereum JSON-RPC transport

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: Option<String>,
    /// `0x1` on success, `0x0` when reverted
    pub status: Option<String>,
    pub gas_used: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref().is_some_and(|s| s == "0x1")
    }
}

pub struct RpcClient {
    url: String,
    http: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: &str) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("creator-rewards/0.1")
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build RPC client: {}", e)))?;
        Ok(Self {
            url: url.to_string(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> AppResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "JSON-RPC request");

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Blockchain(format!("{} request failed: {}", method, e)))?
            .json()
            .await
            .map_err(|e| AppError::Blockchain(format!("{} response unreadable: {}", method, e)))?;

        if let Some(error) = response.error {
            return Err(AppError::Blockchain(format!(
                "{} returned error {}: {}",
                method, error.code, error.message
            )));
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| AppError::Blockchain(format!("{} result malformed: {}", method, e)))
    }

    /// Read-only contract call against the latest block.
    pub async fn eth_call(&self, to: &str, data: &str) -> AppResult<String> {
        self.call("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    /// Node-signed transaction from an unlocked account. Returns the hash.
    pub async fn send_transaction(
        &self,
        from: &str,
        to: &str,
        data: &str,
        gas_limit: u64,
    ) -> AppResult<String> {
        self.call(
            "eth_sendTransaction",
            json!([{
                "from": from,
                "to": to,
                "data": data,
                "gas": format!("0x{:x}", gas_limit),
            }]),
        )
        .await
    }

    /// `None` while the transaction is unmined or unknown.
    pub async fn transaction_receipt(&self, hash: &str) -> AppResult<Option<TransactionReceipt>> {
        self.call("eth_getTransactionReceipt", json!([hash])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_status() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x10",
            "status": "0x1",
            "gasUsed": "0x5208",
        }))
        .unwrap();
        assert!(receipt.succeeded());

        let reverted: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "status": "0x0",
        }))
        .unwrap();
        assert!(!reverted.succeeded());
    }

    #[test]
    fn test_missing_receipt_is_none() {
        let receipt: Option<TransactionReceipt> = serde_json::from_value(Value::Null).unwrap();
        assert!(receipt.is_none());
    }
}
