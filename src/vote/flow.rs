//! Vote submission state machine
//!
//! Idle → Connecting (no address) → ChainChecking (required chain set) →
//! Signing → Submitting (manual paths only) → Done | Error.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::strategy::{StrategyOutput, VoteContext};
use super::submitter::{VoteOutcome, VoteSubmitter};
use crate::chains::RequiredNetwork;
use crate::error::VoteError;
use crate::models::VotePayload;
use crate::wallet::WalletConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteFlowState {
    Idle,
    Connecting,
    ChainChecking,
    Signing,
    Submitting,
    Done,
    Error,
}

impl VoteFlowState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, to: &VoteFlowState) -> bool {
        use VoteFlowState::*;
        match (self, to) {
            (_, Error) => !self.is_terminal(),
            (Idle, Connecting | ChainChecking | Signing) => true,
            (Connecting, ChainChecking | Signing) => true,
            (ChainChecking, Signing) => true,
            // Library path submits internally
            (Signing, Submitting | Done) => true,
            (Submitting, Done) => true,
            (Done | Error, Idle) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VoteFlowState::Done | VoteFlowState::Error)
    }

    /// Submit control is disabled while a signature or relay is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, VoteFlowState::Signing | VoteFlowState::Submitting)
    }
}

/// One user-triggered vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub space: String,
    pub proposal_id: String,
    /// 1-based choice, `None` when nothing is selected
    pub choice: Option<u32>,
    pub app: Option<String>,
    /// Raw metadata JSON override
    pub metadata: Option<String>,
}

/// Drives one vote at a time through the state machine
pub struct VoteFlow {
    submitter: VoteSubmitter,
    required: Option<RequiredNetwork>,
    state: watch::Sender<VoteFlowState>,
    transitions: Mutex<Vec<VoteFlowState>>,
}

impl VoteFlow {
    pub fn new(submitter: VoteSubmitter, required: Option<RequiredNetwork>) -> Self {
        let (state, _) = watch::channel(VoteFlowState::Idle);
        Self {
            submitter,
            required,
            state,
            transitions: Mutex::new(vec![VoteFlowState::Idle]),
        }
    }

    pub fn state(&self) -> VoteFlowState {
        *self.state.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<VoteFlowState> {
        self.state.subscribe()
    }

    /// States visited by the last run, starting with `Idle`
    pub fn transitions(&self) -> Vec<VoteFlowState> {
        self.transitions
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    fn reset(&self) {
        self.state.send_replace(VoteFlowState::Idle);
        if let Ok(mut transitions) = self.transitions.lock() {
            *transitions = vec![VoteFlowState::Idle];
        }
    }

    fn advance(&self, to: VoteFlowState) {
        let from = self.state();
        if !from.can_transition_to(&to) {
            warn!(from = ?from, to = ?to, "Unexpected vote flow transition");
        }
        debug!(from = ?from, to = ?to, "Vote flow transition");
        self.state.send_replace(to);
        if let Ok(mut transitions) = self.transitions.lock() {
            transitions.push(to);
        }
    }

    /// Run one vote to completion. Every failure is returned, never raised
    /// past this boundary; the flow always ends in `Done` or `Error`.
    pub async fn run(
        &self,
        connection: &WalletConnection,
        request: &VoteRequest,
    ) -> Result<VoteOutcome, VoteError> {
        let attempt_id = Uuid::new_v4();
        self.reset();

        // Strategy and relay logs inherit attempt_id from this span
        let span = info_span!("vote", attempt_id = %attempt_id, proposal_id = request.proposal_id);
        let result = self
            .drive(connection, request, attempt_id)
            .instrument(span)
            .await;
        match &result {
            Ok(outcome) => {
                self.advance(VoteFlowState::Done);
                info!(
                    attempt_id = %attempt_id,
                    proposal_id = request.proposal_id,
                    strategy = ?outcome.strategy,
                    "Vote submitted"
                );
            }
            Err(e) => {
                self.advance(VoteFlowState::Error);
                warn!(
                    attempt_id = %attempt_id,
                    proposal_id = request.proposal_id,
                    error = %e,
                    "Vote failed"
                );
            }
        }
        result
    }

    async fn drive(
        &self,
        connection: &WalletConnection,
        request: &VoteRequest,
        attempt_id: Uuid,
    ) -> Result<VoteOutcome, VoteError> {
        let mut address = connection.address().await;
        if address.is_none() {
            self.advance(VoteFlowState::Connecting);
            connection.request_permissions().await;
            connection.request_accounts().await;
            address = connection.address().await;
        }

        let address = address.ok_or(VoteError::NotConnected)?;
        let choice = request.choice.ok_or(VoteError::NoChoice)?;

        if let Some(required) = &self.required {
            self.advance(VoteFlowState::ChainChecking);
            if !connection.ensure_chain(required.id).await {
                return Err(VoteError::NetworkMismatch(required.name.clone()));
            }
        }

        let provider = connection.provider().ok_or(VoteError::NoWallet)?;

        let message = VotePayload::new(&request.space, &request.proposal_id, choice)
            .with_overrides(request.app.as_deref(), request.metadata.as_deref())
            .into_message(address, chrono::Utc::now().timestamp());

        self.advance(VoteFlowState::Signing);
        debug!(attempt_id = %attempt_id, choice = choice, "Signing vote");

        let signed = self
            .submitter
            .sign(&VoteContext {
                provider: provider.as_ref(),
                message: &message,
            })
            .await?;

        let failures = signed.failures.iter().map(|f| f.to_string()).collect();
        let receipt = match signed.output {
            StrategyOutput::Submitted(receipt) => receipt,
            StrategyOutput::Signed(signature) => {
                self.advance(VoteFlowState::Submitting);
                self.submitter.relay(signature, &message).await?
            }
        };

        Ok(VoteOutcome {
            strategy: signed.kind,
            receipt,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use VoteFlowState::*;
        assert!(Idle.can_transition_to(&Connecting));
        assert!(Idle.can_transition_to(&Signing));
        assert!(Connecting.can_transition_to(&ChainChecking));
        assert!(ChainChecking.can_transition_to(&Signing));
        assert!(Signing.can_transition_to(&Done));
        assert!(Signing.can_transition_to(&Submitting));
        assert!(Submitting.can_transition_to(&Done));
        assert!(ChainChecking.can_transition_to(&Error));
        assert!(Done.can_transition_to(&Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        use VoteFlowState::*;
        assert!(!Idle.can_transition_to(&Submitting));
        assert!(!ChainChecking.can_transition_to(&Submitting));
        assert!(!Submitting.can_transition_to(&Signing));
        assert!(!Done.can_transition_to(&Error));
        assert!(!Error.can_transition_to(&Done));
    }

    #[test]
    fn test_busy_states() {
        assert!(VoteFlowState::Signing.is_busy());
        assert!(VoteFlowState::Submitting.is_busy());
        assert!(!VoteFlowState::ChainChecking.is_busy());
        assert!(!VoteFlowState::Done.is_busy());
    }
}
