use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::signer::{SignMethod, WalletSigner};
use super::snapshot_client::SnapshotClient;
use crate::models::{RelayReceipt, TypedData, VoteMessage};
use crate::wallet::Eip1193Provider;

/// Which path produced the vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Voting client signs and relays in one call
    Library,
    /// Manual `eth_signTypedData_v4`, relayed separately
    TypedDataV4,
    /// Manual `personal_sign`, relayed separately
    PersonalSign,
}

/// Inputs shared by every strategy of one attempt
pub struct VoteContext<'a> {
    pub provider: &'a dyn Eip1193Provider,
    pub message: &'a VoteMessage,
}

/// What a successful strategy hands back
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutput {
    /// Already relayed
    Submitted(RelayReceipt),
    /// Signature that still needs relaying
    Signed(String),
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?} failed: {reason}")]
pub struct StrategyFailure {
    pub kind: StrategyKind,
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(kind: StrategyKind, reason: impl ToString) -> Self {
        Self {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// One way of getting a vote signed (and possibly submitted)
#[async_trait]
pub trait VoteStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn execute(&self, ctx: &VoteContext<'_>) -> Result<StrategyOutput, StrategyFailure>;
}

/// Sign and submit through the voting client
pub struct LibraryStrategy {
    client: SnapshotClient,
}

impl LibraryStrategy {
    pub fn new(client: SnapshotClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VoteStrategy for LibraryStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Library
    }

    async fn execute(&self, ctx: &VoteContext<'_>) -> Result<StrategyOutput, StrategyFailure> {
        let signer = WalletSigner::new(ctx.provider, &ctx.message.from);
        self.client
            .send_vote(&signer, ctx.message)
            .await
            .map(StrategyOutput::Submitted)
            .map_err(|e| StrategyFailure::new(self.kind(), e))
    }
}

/// Request a signature over the manual typed data with a single wallet method
pub struct ManualSignStrategy {
    method: SignMethod,
}

impl ManualSignStrategy {
    pub fn typed_data_v4() -> Self {
        Self {
            method: SignMethod::TypedDataV4,
        }
    }

    pub fn personal_sign() -> Self {
        Self {
            method: SignMethod::PersonalSign,
        }
    }
}

#[async_trait]
impl VoteStrategy for ManualSignStrategy {
    fn kind(&self) -> StrategyKind {
        match self.method {
            SignMethod::TypedDataV4 => StrategyKind::TypedDataV4,
            SignMethod::PersonalSign => StrategyKind::PersonalSign,
        }
    }

    async fn execute(&self, ctx: &VoteContext<'_>) -> Result<StrategyOutput, StrategyFailure> {
        let typed = TypedData::manual_vote(ctx.message);
        WalletSigner::new(ctx.provider, &ctx.message.from)
            .sign_with(self.method, &typed)
            .await
            .map(|sig| StrategyOutput::Signed(sig.value))
            .map_err(|e| StrategyFailure::new(self.kind(), e))
    }
}
