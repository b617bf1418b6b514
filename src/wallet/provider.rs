//! EIP-1193 provider abstraction
//!
//! The widget never owns a wallet. It talks to whatever injected (or
//! otherwise reachable) provider was located at startup, exclusively through
//! `request({method, params})` plus the `accountsChanged` / `chainChanged`
//! notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// Wallet does not know the requested chain
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// User rejected the request
pub const USER_REJECTED: i64 = 4001;

/// Error returned by a provider request, shaped like an EIP-1193 `ProviderRpcError`
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }

    /// Error without an EIP-1193 code (transport failures, malformed replies)
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(UNRECOGNIZED_CHAIN)
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Some(USER_REJECTED)
    }
}

/// `{method, params}` argument object of `request`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Notifications a provider may emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    /// Hex chain id
    ChainChanged(String),
}

/// Recognized wallet brands, used to rank multiple injected providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletBrand {
    MetaMask,
    Trust,
    Brave,
    Generic,
}

impl WalletBrand {
    pub fn score(&self) -> u32 {
        match self {
            WalletBrand::MetaMask => 100,
            WalletBrand::Trust => 90,
            WalletBrand::Brave => 80,
            WalletBrand::Generic => 10,
        }
    }
}

/// An EIP-1193 provider
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Brand announced by the provider
    fn brand(&self) -> WalletBrand {
        WalletBrand::Generic
    }

    /// Issue a JSON-RPC style request
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to account/chain notifications, if the provider emits any
    fn subscribe(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_ranking() {
        assert!(WalletBrand::MetaMask.score() > WalletBrand::Trust.score());
        assert!(WalletBrand::Trust.score() > WalletBrand::Brave.score());
        assert!(WalletBrand::Brave.score() > WalletBrand::Generic.score());
    }

    #[test]
    fn test_provider_error_deserialization() {
        let err: ProviderError =
            serde_json::from_str(r#"{"code":4902,"message":"Unrecognized chain ID"}"#).unwrap();
        assert!(err.is_unrecognized_chain());
        assert_eq!(err.to_string(), "Unrecognized chain ID");

        let err: ProviderError = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();
        assert_eq!(err.code, None);
        assert!(!err.is_unrecognized_chain());
    }

    #[test]
    fn test_user_rejection_code() {
        assert!(ProviderError::new(USER_REJECTED, "User rejected the request.").is_user_rejected());
        assert!(!ProviderError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain").is_user_rejected());
        assert!(!ProviderError::other("timeout").is_user_rejected());
    }
}
