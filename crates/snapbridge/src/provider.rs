use crate::errors::ProviderError;
use eyre::Context as _;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// The Provider Gateway: a thin abstraction over the host wallet's request
/// channel.
///
/// A single attempt per call, no retries; failures propagate to the caller
/// wrapped, never swallowed. Injectable so operations can run against a stub
/// in tests.
pub trait WalletProvider {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl std::future::Future<Output = Result<Value, ProviderError>> + Send;
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

/// Production gateway: JSON-RPC 2.0 over HTTP to the wallet endpoint.
#[derive(Debug)]
pub struct HttpWalletProvider {
    client: reqwest::Client,
    url: reqwest::Url,
    next_id: AtomicU64,
}

impl HttpWalletProvider {
    pub fn new(url: &str) -> eyre::Result<Self> {
        let u: reqwest::Url = url
            .parse()
            .with_context(|| format!("invalid wallet rpc url: {url}"))?;
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .connect_timeout(DEFAULT_RPC_CONNECT_TIMEOUT)
            .build()
            .context("build wallet http client")?;
        Ok(Self {
            client,
            url: u,
            next_id: AtomicU64::new(1),
        })
    }

    fn classify(&self, e: &reqwest::Error) -> ProviderError {
        if e.is_connect() || e.is_timeout() {
            ProviderError::Unavailable(self.url.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

impl WalletProvider for HttpWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;
        let resp = resp
            .error_for_status()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let parsed: RpcResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}
