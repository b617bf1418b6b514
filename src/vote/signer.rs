//! Typed-data signing over an EIP-1193 provider
//!
//! Some wallets reject `eth_signTypedData_v4`; for those the same JSON
//! payload is signed with `personal_sign` instead.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::TypedData;
use crate::wallet::{Eip1193Provider, ProviderError};

#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Wallet returned a non-string signature: {0}")]
    Malformed(Value),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Wallet method used to produce a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMethod {
    TypedDataV4,
    PersonalSign,
}

impl SignMethod {
    pub fn rpc_method(&self) -> &'static str {
        match self {
            SignMethod::TypedDataV4 => "eth_signTypedData_v4",
            SignMethod::PersonalSign => "personal_sign",
        }
    }

    /// Parameter order differs: v4 takes `[address, payload]`, personal_sign `[payload, address]`
    fn params(&self, address: &str, payload: &str) -> Value {
        match self {
            SignMethod::TypedDataV4 => json!([address, payload]),
            SignMethod::PersonalSign => json!([payload, address]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub value: String,
    pub method: SignMethod,
}

/// Capability to sign EIP-712 typed data for an address
#[async_trait]
pub trait TypedDataSigner: Send + Sync {
    fn address(&self) -> &str;

    async fn sign_typed_data(&self, typed: &TypedData) -> Result<Signature, SignError>;
}

/// Signer bound to a provider and an account
pub struct WalletSigner<'a> {
    provider: &'a dyn Eip1193Provider,
    address: &'a str,
}

impl<'a> WalletSigner<'a> {
    pub fn new(provider: &'a dyn Eip1193Provider, address: &'a str) -> Self {
        Self { provider, address }
    }

    /// Sign with one specific wallet method, no fallback
    pub async fn sign_with(
        &self,
        method: SignMethod,
        typed: &TypedData,
    ) -> Result<Signature, SignError> {
        let payload = typed.to_json_string()?;
        let value = self
            .provider
            .request(method.rpc_method(), method.params(self.address, &payload))
            .await?;

        match value {
            Value::String(sig) => Ok(Signature { value: sig, method }),
            other => Err(SignError::Malformed(other)),
        }
    }
}

#[async_trait]
impl<'a> TypedDataSigner for WalletSigner<'a> {
    fn address(&self) -> &str {
        self.address
    }

    /// `eth_signTypedData_v4`, falling back to `personal_sign` over the same JSON
    async fn sign_typed_data(&self, typed: &TypedData) -> Result<Signature, SignError> {
        match self.sign_with(SignMethod::TypedDataV4, typed).await {
            Ok(sig) => Ok(sig),
            Err(e) => {
                warn!(error = %e, "eth_signTypedData_v4 failed, falling back to personal_sign");
                self.sign_with(SignMethod::PersonalSign, typed).await
            }
        }
    }
}
