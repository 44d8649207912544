// src/rpc.rs
use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::error::{snippet, ProviderError};
use crate::models::SignatureInfo;

pub const DEFAULT_RPC_URL: &str = "https://rpc.helius.xyz";
pub const DEFAULT_API_URL: &str = "https://api.helius.xyz";

/// Blockchain data the freshness checks depend on.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Whether the account exists on chain at all.
    async fn account_exists(&self, address: &str) -> Result<bool, ProviderError>;

    /// One page of signatures touching `address`, newest first, strictly
    /// older than `before` when given.
    async fn signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError>;

    /// Number of records the transaction-history endpoint returns for `address`.
    async fn transaction_count(&self, address: &str) -> Result<usize, ProviderError>;
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub rpc_url: String,
    pub api_url: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("rpc_url", &self.rpc_url)
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcResponse<T> {
    Success { result: T },
    Error { error: RpcError },
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    value: Option<Value>,
}

/// Helius JSON-RPC + REST client.
pub struct HeliusClient {
    http: Client,
    rpc_url: String,
    api_url: String,
    api_key: String,
}

impl HeliusClient {
    pub fn new(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            rpc_url: cfg.rpc_url.trim_end_matches('/').to_string() + "/",
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        debug!("📡 Sending {} → {}", method, self.rpc_url);

        let resp = self
            .http
            .post(&self.rpc_url)
            .query(&[("api-key", &self.api_key)])
            .json(&payload)
            .send()
            .await?;
        let text = read_success(resp).await?;

        match serde_json::from_str::<RpcResponse<T>>(&text) {
            Ok(RpcResponse::Success { result }) => Ok(result),
            Ok(RpcResponse::Error { error }) => Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
            }),
            Err(source) => Err(ProviderError::Decode {
                source,
                body: snippet(&text),
            }),
        }
    }
}

/// Body of a 2xx response, or a `Status` error carrying the start of the body.
async fn read_success(resp: reqwest::Response) -> Result<String, ProviderError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: snippet(&text),
        });
    }
    Ok(text)
}

#[async_trait]
impl ChainProvider for HeliusClient {
    async fn account_exists(&self, address: &str) -> Result<bool, ProviderError> {
        let info: AccountInfo = self
            .call(
                "getAccountInfo",
                json!([address, { "encoding": "base64" }]),
            )
            .await?;
        Ok(info.value.is_some())
    }

    async fn signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError> {
        let mut opts = json!({ "limit": limit });
        if let Some(before) = before {
            opts["before"] = json!(before);
        }
        self.call("getSignaturesForAddress", json!([address, opts]))
            .await
    }

    async fn transaction_count(&self, address: &str) -> Result<usize, ProviderError> {
        let url = format!("{}/v0/addresses/{}/transactions", self.api_url, address);
        debug!("📡 Fetching transaction history → {}", url);

        let resp = self
            .http
            .get(&url)
            .query(&[("api-key", &self.api_key)])
            .send()
            .await?;
        let text = read_success(resp).await?;

        let records: Vec<Value> =
            serde_json::from_str(&text).map_err(|source| ProviderError::Decode {
                source,
                body: snippet(&text),
            })?;
        Ok(records.len())
    }
}
