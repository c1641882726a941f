use crate::blockchain::abi::{parse_quantity, AbiError};
use crate::blockchain::models::{BlockPayload, ReceiptPayload};
use crate::config::Config;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

const SERVICE: &str = "chain_client";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC request timed out: {0}")]
    Timeout(String),

    #[error("Peer desync: sent id {expected}, got {received}")]
    IdMismatch { expected: u64, received: String },

    #[error("Peer error {code}: {message}")]
    Peer { code: i64, message: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Invalid quantity: {0}")]
    Quantity(#[from] AbiError),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorPayload>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorPayload {
    code: i64,
    message: String,
}

/// Stateless JSON-RPC client for an EVM peer. Every request gets a fresh random id and a
/// response echoing any other id is rejected.
pub struct EthClient {
    http: reqwest::Client,
    rpc_url: String,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl EthClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Self::with_options(
            &config.eth_rpc_url,
            Duration::from_secs(config.rpc_timeout_secs),
            config.rpc_rate_limit,
        )
    }

    pub fn with_options(
        rpc_url: &str,
        timeout: Duration,
        rate_limit: Option<u32>,
    ) -> Result<Self, ClientError> {
        info!(service = SERVICE, "Initializing EVM client with RPC endpoint: {}", rpc_url);

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let limiter = rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_sec| RateLimiter::direct(Quota::per_second(per_sec)));

        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            limiter,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Option<Value>, ClientError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let id = rand::random::<u32>() as u64;
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let body = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify(method, e))?
            .error_for_status()?
            .text()
            .await
            .map_err(|e| classify(method, e))?;

        let response: RpcResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Malformed(format!("{}: {}", method, e)))?;

        match response.id.as_ref().and_then(Value::as_u64) {
            Some(received) if received == id => {}
            _ => {
                let received = response.id.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string());
                error!(service = SERVICE, method, expected = id, %received, "response id mismatch");
                return Err(ClientError::IdMismatch { expected: id, received });
            }
        }

        if let Some(err) = response.error {
            return Err(ClientError::Peer {
                code: err.code,
                message: err.message,
            });
        }

        Ok(response.result.filter(|v| !v.is_null()))
    }

    /// Block with full transaction objects, `None` if the peer does not know it.
    pub async fn get_block_by_number(&self, block: i64) -> Result<Option<BlockPayload>, ClientError> {
        debug!(service = SERVICE, block, "eth_getBlockByNumber");
        let params = json!([format!("0x{:x}", block), true]);
        self.call("eth_getBlockByNumber", params)
            .await?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ClientError::Malformed(format!("block {}: {}", block, e)))
            })
            .transpose()
    }

    pub async fn get_transaction_receipt(&self, txid: &str) -> Result<Option<ReceiptPayload>, ClientError> {
        debug!(service = SERVICE, txid, "eth_getTransactionReceipt");
        self.call("eth_getTransactionReceipt", json!([txid]))
            .await?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ClientError::Malformed(format!("receipt {}: {}", txid, e)))
            })
            .transpose()
    }

    /// Read-only `eth_call` against latest state. Returns the raw hex result.
    pub async fn call_contract(&self, address: &str, data: &str) -> Result<Option<String>, ClientError> {
        debug!(service = SERVICE, address, data, "eth_call");
        let params = json!([{ "to": address, "data": data }, "latest"]);
        match self.call("eth_call", params).await? {
            Some(Value::String(raw)) => Ok(Some(raw)),
            Some(other) => Err(ClientError::Malformed(format!("eth_call {}: {}", address, other))),
            None => Ok(None),
        }
    }

    pub async fn block_number(&self) -> Result<i64, ClientError> {
        match self.call("eth_blockNumber", json!([])).await? {
            Some(Value::String(raw)) => Ok(parse_quantity(&raw)?),
            other => Err(ClientError::Malformed(format!("eth_blockNumber: {:?}", other))),
        }
    }
}

fn classify(method: &str, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(method.to_string())
    } else {
        ClientError::Transport(err)
    }
}
