use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_types::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::AdapterError;

/// One entry of `preTokenBalances`/`postTokenBalances` (§4.8 step 4).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalanceEntry {
    pub mint: String,
    pub owner: Address,
    #[serde(rename = "uiAmount", default)]
    pub ui_amount: Decimal,
}

/// The meta block of a parsed transaction. Its absence is itself
/// meaningful (§4.8 step 3: still emit a swap record with zero fields).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMeta {
    #[serde(rename = "err")]
    pub err: Option<serde_json::Value>,
    #[serde(rename = "preTokenBalances", default)]
    pub pre_token_balances: Vec<TokenBalanceEntry>,
    #[serde(rename = "postTokenBalances", default)]
    pub post_token_balances: Vec<TokenBalanceEntry>,
}

/// Result of `getParsedTransaction` (§6).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedTransaction {
    pub signature: String,
    pub slot: u64,
    pub fee_payer: Address,
    pub meta: Option<TransactionMeta>,
    /// Milliseconds since epoch, as the provider returns it; §4.8 step 7
    /// divides this by 1000 and clamps at 0.
    pub block_time_millis: Option<i64>,
}

/// Thin typed wrapper over `getParsedTransaction`/`getBlockTime` (C9, §6).
/// No business logic: classification and retry policy live in
/// `ingest-live`, not here.
#[async_trait]
pub trait RpcAdapter: Send + Sync {
    async fn get_parsed_transaction(&self, signature: &str) -> Result<ParsedTransaction, AdapterError>;

    async fn get_block_time(&self, slot: u64) -> Result<DateTime<Utc>, AdapterError>;
}

/// `reqwest`-backed JSON-RPC 2.0 client for the blockchain RPC endpoint.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl HttpRpcClient {
    pub fn new(endpoint: url::Url) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AdapterError::Fatal(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, AdapterError> {
        #[derive(Deserialize)]
        struct RpcResponse<T> {
            result: Option<T>,
            error: Option<RpcErrorBody>,
        }

        #[derive(Deserialize)]
        struct RpcErrorBody {
            message: String,
        }

        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::Transient(e.to_string()))?;

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| AdapterError::DataShape(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(AdapterError::NotFound(error.message));
        }

        parsed.result.ok_or_else(|| AdapterError::NotFound(format!("{method}: empty result")))
    }
}

#[async_trait]
impl RpcAdapter for HttpRpcClient {
    async fn get_parsed_transaction(&self, signature: &str) -> Result<ParsedTransaction, AdapterError> {
        self.call(
            "getParsedTransaction",
            json!([signature, { "maxSupportedTransactionVersion": 0 }]),
        )
        .await
    }

    async fn get_block_time(&self, slot: u64) -> Result<DateTime<Utc>, AdapterError> {
        let seconds: i64 = self.call("getBlockTime", json!([slot])).await?;
        DateTime::<Utc>::from_timestamp(seconds, 0)
            .ok_or_else(|| AdapterError::DataShape(format!("invalid block time for slot {slot}")))
    }
}
