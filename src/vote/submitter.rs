use serde::Serialize;
use tracing::{info, warn};

use super::snapshot_client::SnapshotClient;
use super::strategy::{
    LibraryStrategy, ManualSignStrategy, StrategyFailure, StrategyKind, StrategyOutput,
    VoteContext, VoteStrategy,
};
use crate::error::VoteError;
use crate::hub::HubClient;
use crate::models::{ManualVoteData, RelayReceipt, SignedEnvelope, VoteMessage};

/// Result of the signing stage
#[derive(Debug)]
pub struct SigningResult {
    pub kind: StrategyKind,
    pub output: StrategyOutput,
    /// Failures of strategies tried before the winning one
    pub failures: Vec<StrategyFailure>,
}

/// A completed vote and the path that delivered it
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub strategy: StrategyKind,
    pub receipt: RelayReceipt,
    pub failures: Vec<String>,
}

/// Ordered list of signing strategies plus the manual relay step
pub struct VoteSubmitter {
    strategies: Vec<Box<dyn VoteStrategy>>,
    hub: HubClient,
}

impl VoteSubmitter {
    pub fn new(hub: HubClient, strategies: Vec<Box<dyn VoteStrategy>>) -> Self {
        Self { strategies, hub }
    }

    /// Library call, then typed-data v4, then personal_sign
    pub fn standard(hub: HubClient) -> Self {
        let client = SnapshotClient::with_hub(hub.clone());
        Self::new(
            hub,
            vec![
                Box::new(LibraryStrategy::new(client)),
                Box::new(ManualSignStrategy::typed_data_v4()),
                Box::new(ManualSignStrategy::personal_sign()),
            ],
        )
    }

    pub fn order(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Try each strategy in order, stopping at the first success
    pub async fn sign(&self, ctx: &VoteContext<'_>) -> Result<SigningResult, VoteError> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.execute(ctx).await {
                Ok(output) => {
                    info!(strategy = ?strategy.kind(), previous_failures = failures.len(), "Signing strategy succeeded");
                    return Ok(SigningResult {
                        kind: strategy.kind(),
                        output,
                        failures,
                    });
                }
                Err(failure) => {
                    warn!(strategy = ?failure.kind, reason = %failure.reason, "Signing strategy failed, trying next");
                    failures.push(failure);
                }
            }
        }

        Err(VoteError::SigningFailed)
    }

    /// Relay a manually signed vote
    pub async fn relay(
        &self,
        signature: String,
        message: &VoteMessage,
    ) -> Result<RelayReceipt, VoteError> {
        let envelope = SignedEnvelope {
            address: message.from.clone(),
            sig: signature,
            data: ManualVoteData::new(message.clone()),
        };
        Ok(self.hub.submit_message(&envelope).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::models::VotePayload;
    use crate::testing::{RecordingProvider, StubTransport};

    /// Strategy that records its invocation and returns a fixed outcome
    struct Scripted {
        kind: StrategyKind,
        succeed: bool,
        log: Arc<Mutex<Vec<StrategyKind>>>,
    }

    #[async_trait]
    impl VoteStrategy for Scripted {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn execute(&self, _ctx: &VoteContext<'_>) -> Result<StrategyOutput, StrategyFailure> {
            self.log.lock().unwrap().push(self.kind);
            if self.succeed {
                Ok(StrategyOutput::Signed(format!("{:?}", self.kind)))
            } else {
                Err(StrategyFailure::new(self.kind, "scripted failure"))
            }
        }
    }

    fn submitter(outcomes: &[(StrategyKind, bool)], log: &Arc<Mutex<Vec<StrategyKind>>>) -> VoteSubmitter {
        let hub = HubClient::with_transport("https://hub.example.org", Arc::new(StubTransport::new()));
        let strategies = outcomes
            .iter()
            .map(|(kind, succeed)| {
                Box::new(Scripted {
                    kind: *kind,
                    succeed: *succeed,
                    log: log.clone(),
                }) as Box<dyn VoteStrategy>
            })
            .collect();
        VoteSubmitter::new(hub, strategies)
    }

    fn message() -> VoteMessage {
        VotePayload::new("tolena.eth", "p1", 1).into_message("0xabc", 1700000000)
    }

    #[test]
    fn test_standard_order() {
        let hub = HubClient::with_transport("https://hub.example.org", Arc::new(StubTransport::new()));
        assert_eq!(
            VoteSubmitter::standard(hub).order(),
            vec![StrategyKind::Library, StrategyKind::TypedDataV4, StrategyKind::PersonalSign]
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let submitter = submitter(
            &[
                (StrategyKind::Library, false),
                (StrategyKind::TypedDataV4, true),
                (StrategyKind::PersonalSign, true),
            ],
            &log,
        );
        let provider = RecordingProvider::new();
        let msg = message();

        let result = submitter
            .sign(&VoteContext { provider: &provider, message: &msg })
            .await
            .unwrap();

        assert_eq!(result.kind, StrategyKind::TypedDataV4);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, StrategyKind::Library);
        assert_eq!(*log.lock().unwrap(), vec![StrategyKind::Library, StrategyKind::TypedDataV4]);
    }

    #[tokio::test]
    async fn test_all_failures_report_signing_failed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let submitter = submitter(
            &[
                (StrategyKind::Library, false),
                (StrategyKind::TypedDataV4, false),
                (StrategyKind::PersonalSign, false),
            ],
            &log,
        );
        let provider = RecordingProvider::new();
        let msg = message();

        let err = submitter
            .sign(&VoteContext { provider: &provider, message: &msg })
            .await
            .unwrap_err();
        assert!(matches!(err, VoteError::SigningFailed));
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_relay_posts_manual_envelope() {
        let transport = Arc::new(StubTransport::new().with_reply(
            "https://hub.example.org/api/msg",
            200,
            json!({ "id": "0xok" }),
        ));
        let hub = HubClient::with_transport("https://hub.example.org", transport.clone());
        let submitter = VoteSubmitter::new(hub, Vec::new());

        let receipt = submitter.relay("0xsig".to_string(), &message()).await.unwrap();
        assert_eq!(receipt.id.as_deref(), Some("0xok"));

        let body = &transport.requests()[0].1;
        assert_eq!(body["address"], "0xabc");
        assert_eq!(body["sig"], "0xsig");
        assert_eq!(body["data"]["type"], "vote");
        assert_eq!(body["data"]["payload"]["proposal"], "p1");
    }
}
