//! EVM JSON-RPC ledger client.
//!
//! Uses `eth_getBlockByHash`, `eth_getLogs` (scoped by `blockHash`), and
//! `eth_getBlockByNumber` over HTTP. Requests are sent once; retry and
//! backoff are left to the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use chainsync_core::error::SyncError;
use chainsync_core::ledger::LedgerClient;
use chainsync_core::types::{parse_hex_u64, Block, BlockHash, RawLog};

/// HTTP JSON-RPC implementation of [`LedgerClient`].
pub struct JsonRpcLedger {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Create a client for the given endpoint with a 30 s request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, SyncError> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SyncError::rpc)?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and return its `result` member.
    async fn call(&self, method: &str, params: Value) -> Result<Value, SyncError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = request_body(id, method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(SyncError::rpc)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(SyncError::Rpc(format!("HTTP {status}: {text}")));
        }

        let envelope: Value = resp.json().await.map_err(SyncError::rpc)?;
        tracing::trace!(method, id, "rpc response");
        into_result(method, envelope)
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn get_block(&self, hash: &BlockHash) -> Result<Option<Block>, SyncError> {
        let result = self
            .call("eth_getBlockByHash", json!([hash.as_str(), false]))
            .await?;
        parse_block(&result)
    }

    async fn get_logs(
        &self,
        address: &str,
        block_hash: &BlockHash,
    ) -> Result<Vec<RawLog>, SyncError> {
        let result = self
            .call(
                "eth_getLogs",
                json!([{ "address": address, "blockHash": block_hash.as_str() }]),
            )
            .await?;
        serde_json::from_value(result).map_err(|e| SyncError::Rpc(format!("malformed logs: {e}")))
    }

    async fn canonical_hash(&self, number: u64) -> Result<Option<BlockHash>, SyncError> {
        let result = self
            .call("eth_getBlockByNumber", json!([format!("0x{number:x}"), false]))
            .await?;
        Ok(parse_block(&result)?.map(|b| b.hash))
    }
}

/// Build a JSON-RPC 2.0 request object.
pub fn request_body(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Extract `result` from a response envelope, mapping `error` objects to `SyncError::Rpc`.
pub fn into_result(method: &str, mut envelope: Value) -> Result<Value, SyncError> {
    if let Some(err) = envelope.get("error").filter(|e| !e.is_null()) {
        let code = err["code"].as_i64().unwrap_or_default();
        let message = err["message"].as_str().unwrap_or("unknown error");
        return Err(SyncError::Rpc(format!("{method} failed ({code}): {message}")));
    }
    Ok(envelope
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

/// Parse a block result; `null` means the node does not know the block.
pub fn parse_block(v: &Value) -> Result<Option<Block>, SyncError> {
    if v.is_null() {
        return Ok(None);
    }
    block_from_json(v)
        .map(Some)
        .ok_or_else(|| SyncError::Rpc(format!("malformed block: {v}")))
}

/// Convert a JSON block object to a [`Block`].
pub fn block_from_json(v: &Value) -> Option<Block> {
    Some(Block {
        number: parse_hex_u64(v["number"].as_str()?),
        hash: BlockHash::new(v["hash"].as_str()?),
        parent_hash: BlockHash::new(v["parentHash"].as_str()?),
        timestamp: parse_hex_u64(v["timestamp"].as_str()?) as i64,
    })
}
