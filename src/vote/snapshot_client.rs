//! Voting client speaking the hub's own typed-data vote format
//!
//! This is the preferred submission path: it signs and relays in one call.
//! Signing goes through [`TypedDataSigner`], so a wallet lacking
//! `eth_signTypedData_v4` still gets a `personal_sign` prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::signer::{SignError, TypedDataSigner, WalletSigner};
use crate::hub::{HubClient, HubError};
use crate::models::{
    RelayReceipt, SignedEnvelope, TypedData, TypedVoteData, VoteMessage, VotePayload, VotingType,
};
use crate::wallet::Eip1193Provider;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("Unsupported voting type: {0:?}")]
    UnsupportedType(VotingType),
}

/// Vote fields accepted by [`SnapshotClient::vote`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteFields {
    pub space: String,
    pub proposal: String,
    #[serde(rename = "type")]
    pub voting_type: VotingType,
    pub choice: u32,
    pub reason: String,
    pub app: String,
    pub metadata: Value,
}

impl From<&VotePayload> for VoteFields {
    fn from(payload: &VotePayload) -> Self {
        Self {
            space: payload.space.clone(),
            proposal: payload.proposal.clone(),
            voting_type: VotingType::SingleChoice,
            choice: payload.choice,
            reason: payload.reason.clone(),
            app: payload.app.clone(),
            metadata: payload.metadata.clone(),
        }
    }
}

/// Client bound to one hub
#[derive(Clone)]
pub struct SnapshotClient {
    hub: HubClient,
}

impl SnapshotClient {
    pub fn with_hub(hub: HubClient) -> Self {
        Self { hub }
    }

    /// Sign and relay a vote, stamping it with the current time
    pub async fn vote(
        &self,
        provider: &dyn Eip1193Provider,
        address: &str,
        fields: &VoteFields,
    ) -> Result<RelayReceipt, ClientError> {
        if !fields.voting_type.is_single_selection() {
            return Err(ClientError::UnsupportedType(fields.voting_type));
        }

        let payload = VotePayload {
            space: fields.space.clone(),
            proposal: fields.proposal.clone(),
            choice: fields.choice,
            reason: fields.reason.clone(),
            app: fields.app.clone(),
            metadata: fields.metadata.clone(),
        };
        let message = payload.into_message(address, chrono::Utc::now().timestamp());

        self.send_vote(&WalletSigner::new(provider, address), &message)
            .await
    }

    /// Sign a prepared message and relay it
    pub async fn send_vote(
        &self,
        signer: &dyn TypedDataSigner,
        message: &VoteMessage,
    ) -> Result<RelayReceipt, ClientError> {
        let typed = TypedData::hub_vote(message);
        let signature = signer.sign_typed_data(&typed).await?;

        let envelope = SignedEnvelope {
            address: signer.address().to_string(),
            sig: signature.value,
            data: TypedVoteData::from(&typed),
        };

        let receipt = self.hub.submit_message(&envelope).await?;
        info!(
            proposal = message.proposal,
            method = ?signature.method,
            "Vote relayed in hub format"
        );
        Ok(receipt)
    }
}
