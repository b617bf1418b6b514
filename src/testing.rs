//! Test doubles shared by unit and flow tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::hub::{HttpReply, HubError, HubTransport};
use crate::wallet::{Eip1193Provider, ProviderError, RequestArguments, WalletBrand, WalletEvent};

type Scripted<T> = Mutex<HashMap<String, VecDeque<T>>>;

/// Pop the next scripted entry; the last one stays and repeats
fn next_scripted<T: Clone>(script: &Scripted<T>, key: &str) -> Option<T> {
    let mut script = script.lock().unwrap();
    let queue = script.get_mut(key)?;
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// EIP-1193 provider with scripted replies that records every request in order
pub struct RecordingProvider {
    brand: WalletBrand,
    script: Scripted<Result<Value, ProviderError>>,
    calls: Mutex<Vec<RequestArguments>>,
    events: broadcast::Sender<WalletEvent>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            brand: WalletBrand::Generic,
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn with_brand(mut self, brand: WalletBrand) -> Self {
        self.brand = brand;
        self
    }

    pub fn with_response(self, method: &str, value: Value) -> Self {
        self.push(method, Ok(value));
        self
    }

    pub fn with_error(self, method: &str, error: ProviderError) -> Self {
        self.push(method, Err(error));
        self
    }

    /// Replace the script for `method` while the provider is shared
    pub fn set_response(&self, method: &str, value: Value) {
        self.script.lock().unwrap().remove(method);
        self.push(method, Ok(value));
    }

    fn push(&self, method: &str, outcome: Result<Value, ProviderError>) {
        self.script
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    pub fn calls(&self) -> Vec<RequestArguments> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn position(&self, method: &str) -> Option<usize> {
        self.methods().iter().position(|m| m == method)
    }
}

#[async_trait]
impl Eip1193Provider for RecordingProvider {
    fn brand(&self) -> WalletBrand {
        self.brand
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(RequestArguments {
            method: method.to_string(),
            params,
        });
        next_scripted(&self.script, method)
            .unwrap_or_else(|| Err(ProviderError::new(4200, format!("{} not supported", method))))
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        Some(self.events.subscribe())
    }
}

/// Hub transport with scripted replies per URL that records request bodies
pub struct StubTransport {
    script: Scripted<HttpReply>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, url: &str, status: u16, body: Value) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(HttpReply { status, body });
        self
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|(u, _)| u == url)
            .map(|(_, body)| body)
            .collect()
    }
}

#[async_trait]
impl HubTransport for StubTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, HubError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        next_scripted(&self.script, url)
            .ok_or_else(|| HubError::InvalidResponse(format!("no reply scripted for {}", url)))
    }
}
