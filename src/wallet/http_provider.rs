//! EIP-1193 provider backed by a JSON-RPC signer over HTTP
//!
//! Lets the terminal front end drive a local signer (e.g. a desktop wallet
//! exposing an RPC port) with the same request surface as an injected
//! browser wallet. HTTP has no push channel, so account and chain changes are
//! detected by optional polling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::provider::{Eip1193Provider, ProviderError, WalletBrand, WalletEvent};
use crate::error::pretty_error;

const EVENT_CAPACITY: usize = 16;

/// Floor for the polling period; a zero period would make `interval` panic
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(flatten)]
    result: RpcResult,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcResult {
    Error { error: Value },
    Success { result: Value },
}

/// Wallet provider that forwards every request to a JSON-RPC endpoint
pub struct HttpWalletProvider {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    brand: WalletBrand,
    events: broadcast::Sender<WalletEvent>,
}

impl HttpWalletProvider {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            brand: WalletBrand::Generic,
            events,
        }
    }

    /// Announce a specific brand (affects provider ranking only)
    pub fn with_brand(mut self, brand: WalletBrand) -> Self {
        self.brand = brand;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Poll accounts and chain id, emitting events when either changes
    pub fn spawn_polling(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        let every = every.max(MIN_POLL_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            let mut last_accounts: Option<Vec<String>> = None;
            let mut last_chain: Option<String> = None;

            loop {
                ticker.tick().await;

                if let Ok(value) = provider.request("eth_accounts", json!([])).await {
                    if let Ok(accounts) = serde_json::from_value::<Vec<String>>(value) {
                        if last_accounts.as_ref() != Some(&accounts) {
                            if last_accounts.is_some() {
                                let _ = provider
                                    .events
                                    .send(WalletEvent::AccountsChanged(accounts.clone()));
                            }
                            last_accounts = Some(accounts);
                        }
                    }
                }

                if let Ok(Value::String(chain)) = provider.request("eth_chainId", json!([])).await {
                    if last_chain.as_ref() != Some(&chain) {
                        if last_chain.is_some() {
                            let _ = provider.events.send(WalletEvent::ChainChanged(chain.clone()));
                        }
                        last_chain = Some(chain);
                    }
                }
            }
        })
    }
}

/// Map a JSON-RPC reply body to a request outcome
fn parse_reply(text: &str) -> Result<Value, ProviderError> {
    let response: RpcResponse = serde_json::from_str(text)
        .map_err(|e| ProviderError::other(format!("Invalid JSON-RPC reply: {}", e)))?;

    match response.result {
        RpcResult::Success { result } => Ok(result),
        RpcResult::Error { error } => Err(serde_json::from_value::<ProviderError>(error.clone())
            .unwrap_or_else(|_| ProviderError::other(pretty_error(&error)))),
    }
}

#[async_trait]
impl Eip1193Provider for HttpWalletProvider {
    fn brand(&self) -> WalletBrand {
        self.brand
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!(method = method, id = request.id, "Wallet RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::other(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::other(e.to_string()))?;

        if !status.is_success() {
            warn!(method = method, status = %status, "Wallet RPC returned HTTP error");
            return Err(ProviderError::other(format!("HTTP {}: {}", status, text)));
        }

        parse_reply(&text)
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        Some(self.events.subscribe())
    }
}
