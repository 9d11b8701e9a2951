//! # JSON-RPC Event Source
//!
//! Reads `PaymentReceived(address,uint256,address,uint256)` logs from the
//! receiver contract over standard Ethereum JSON-RPC (`eth_blockNumber`,
//! `eth_getLogs`).
//!
//! All four event arguments are non-indexed, so they arrive as four 32-byte
//! words in the log's `data` field: buyer, value, token, paymentId.

use crate::domain::FeedError;
use crate::ports::ChainEventSource;
use async_trait::async_trait;
use primitive_types::U256;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use shared_types::{keccak256, Address, ChainPaymentEvent, Hash, TxHash};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Canonical event signature.
pub const PAYMENT_RECEIVED_SIGNATURE: &str = "PaymentReceived(address,uint256,address,uint256)";

const WORD: usize = 32;

/// `topic0` of the payment event.
pub fn payment_received_topic() -> Hash {
    keccak256(PAYMENT_RECEIVED_SIGNATURE.as_bytes())
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// One entry of an `eth_getLogs` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    #[serde(default)]
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

/// Chain event source backed by a JSON-RPC provider.
pub struct JsonRpcEventSource {
    http_client: reqwest::Client,
    rpc_url: String,
    contract: Address,
    topic: String,
    request_id: AtomicU64,
}

impl JsonRpcEventSource {
    pub fn new(rpc_url: impl Into<String>, contract: Address) -> Self {
        Self::with_timeout(rpc_url, contract, Duration::from_secs(10))
    }

    pub fn with_timeout(rpc_url: impl Into<String>, contract: Address, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            rpc_url: rpc_url.into(),
            contract,
            topic: format!("0x{}", hex::encode(payment_received_topic())),
            request_id: AtomicU64::new(1),
        }
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, FeedError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FeedError::Connectivity(format!("{method}: {e}")))?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| FeedError::MalformedResponse(format!("{method}: {e}")))?;

        if let Some(error) = rpc_response.error {
            return Err(FeedError::Connectivity(format!(
                "{method}: RPC error {}: {}",
                error.code, error.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| FeedError::MalformedResponse(format!("{method}: missing result")))
    }
}

#[async_trait]
impl ChainEventSource for JsonRpcEventSource {
    async fn head_block(&self) -> Result<u64, FeedError> {
        let result: String = self.call("eth_blockNumber", Vec::<()>::new()).await?;
        parse_quantity(&result).ok_or_else(|| {
            FeedError::MalformedResponse(format!("eth_blockNumber: bad quantity {result}"))
        })
    }

    async fn fetch_events(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<ChainPaymentEvent>, FeedError> {
        let filter = json!([{
            "address": self.contract.to_string(),
            "fromBlock": format!("0x{from:x}"),
            "toBlock": format!("0x{to:x}"),
            "topics": [self.topic],
        }]);
        let logs: Vec<RpcLog> = self.call("eth_getLogs", filter).await?;
        debug!(from, to, logs = logs.len(), "fetched payment logs");

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            if log.removed {
                debug!(tx = ?log.transaction_hash, "skipping removed log");
                continue;
            }
            match decode_log(log) {
                Ok(event) => events.push(event),
                Err(reason) => warn!(
                    tx = ?log.transaction_hash,
                    reason = %reason,
                    "skipping malformed payment log"
                ),
            }
        }
        Ok(events)
    }
}

fn parse_quantity(value: &str) -> Option<u64> {
    let digits = value.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}

/// Decode a raw log into a payment event.
pub fn decode_log(log: &RpcLog) -> Result<ChainPaymentEvent, String> {
    let block_number = log
        .block_number
        .as_deref()
        .and_then(parse_quantity)
        .ok_or("missing block number")?;
    let log_index = log
        .log_index
        .as_deref()
        .and_then(parse_quantity)
        .ok_or("missing log index")?;
    let tx_hash = log
        .transaction_hash
        .as_deref()
        .ok_or("missing transaction hash")
        .and_then(|h| TxHash::parse(h).map_err(|_| "bad transaction hash"))?;

    let data = log.data.strip_prefix("0x").unwrap_or(&log.data);
    let bytes = hex::decode(data).map_err(|e| format!("bad data hex: {e}"))?;
    if bytes.len() != 4 * WORD {
        return Err(format!("expected {} data bytes, got {}", 4 * WORD, bytes.len()));
    }

    let word = |i: usize| -> [u8; WORD] {
        let mut out = [0u8; WORD];
        out.copy_from_slice(&bytes[i * WORD..(i + 1) * WORD]);
        out
    };

    Ok(ChainPaymentEvent {
        block_number,
        tx_hash,
        log_index,
        payer: Address::from_word(&word(0)),
        amount: U256::from_big_endian(&word(1)),
        token: Address::from_word(&word(2)),
        payment_reference: format!("0x{}", hex::encode(word(3))),
    })
}
