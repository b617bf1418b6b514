use crate::error::VoteError;
use crate::vote::{VoteFlowState, VoteRequest};
use crate::wallet::WalletSession;

pub const SUBMIT_LABEL: &str = "Submit vote";
pub const CONNECT_TO_VOTE_LABEL: &str = "Connect wallet to vote";
pub const SUBMITTING_TEXT: &str = "Submitting vote…";
pub const SUBMITTED_TEXT: &str = "Vote submitted ✅";

/// Derived state of a ballot's submit control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotControls {
    pub label: &'static str,
    pub enabled: bool,
}

/// Inline ballot for a single-choice proposal
#[derive(Debug, Clone, PartialEq)]
pub struct Ballot {
    pub proposal_id: String,
    pub choices: Vec<String>,
    selected: Option<u32>,
    busy: bool,
    status: String,
    app: Option<String>,
    metadata: Option<String>,
}

impl Ballot {
    pub fn new(proposal_id: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            choices,
            selected: None,
            busy: false,
            status: String::new(),
            app: None,
            metadata: None,
        }
    }

    /// Per-ballot app tag and raw metadata JSON
    pub fn with_overrides(mut self, app: Option<String>, metadata: Option<String>) -> Self {
        self.app = app;
        self.metadata = metadata;
        self
    }

    /// Select a 1-based choice
    pub fn select(&mut self, choice: u32) -> Result<(), VoteError> {
        if choice == 0 || choice as usize > self.choices.len() {
            return Err(VoteError::InvalidChoice {
                choice,
                available: self.choices.len(),
            });
        }
        self.selected = Some(choice);
        Ok(())
    }

    pub fn selected(&self) -> Option<u32> {
        self.selected
    }

    pub fn selected_label(&self) -> Option<&str> {
        let index = self.selected?.checked_sub(1)? as usize;
        self.choices.get(index).map(String::as_str)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Submit is enabled iff an address is connected and a choice is
    /// selected, and no submission is in flight.
    pub fn controls(&self, session: &WalletSession) -> BallotControls {
        let connected = session.is_connected();
        BallotControls {
            label: if connected {
                SUBMIT_LABEL
            } else {
                CONNECT_TO_VOTE_LABEL
            },
            enabled: connected && self.selected.is_some() && !self.busy,
        }
    }

    pub fn request(&self, space: &str) -> VoteRequest {
        VoteRequest {
            space: space.to_string(),
            proposal_id: self.proposal_id.clone(),
            choice: self.selected,
            app: self.app.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Progress text shown while a vote is in flight
pub fn progress_text(state: VoteFlowState) -> Option<&'static str> {
    state.is_busy().then_some(SUBMITTING_TEXT)
}

/// Emits the progress text once per run, however many busy states follow
#[derive(Debug, Default)]
pub struct ProgressLine {
    shown: bool,
}

impl ProgressLine {
    pub fn update(&mut self, state: VoteFlowState) -> Option<&'static str> {
        if state == VoteFlowState::Idle {
            self.shown = false;
            return None;
        }
        if self.shown {
            return None;
        }
        let text = progress_text(state)?;
        self.shown = true;
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot() -> Ballot {
        Ballot::new("p1", vec!["Yes".to_string(), "No".to_string()])
    }

    fn session(address: Option<&str>) -> WalletSession {
        WalletSession {
            address: address.map(str::to_string),
            chain_id: 1,
        }
    }

    #[test]
    fn test_enabled_iff_address_and_choice() {
        for connected in [false, true] {
            for picked in [false, true] {
                let mut b = ballot();
                if picked {
                    b.select(1).unwrap();
                }
                let controls = b.controls(&session(connected.then_some("0xabc")));
                assert_eq!(controls.enabled, connected && picked, "connected={connected} picked={picked}");
            }
        }
    }

    #[test]
    fn test_label_follows_connection() {
        let b = ballot();
        assert_eq!(b.controls(&session(None)).label, CONNECT_TO_VOTE_LABEL);
        assert_eq!(b.controls(&session(Some("0xabc"))).label, SUBMIT_LABEL);
    }

    #[test]
    fn test_busy_disables_submit() {
        let mut b = ballot();
        b.select(2).unwrap();
        b.set_busy(true);
        assert!(!b.controls(&session(Some("0xabc"))).enabled);
        b.set_busy(false);
        assert!(b.controls(&session(Some("0xabc"))).enabled);
    }

    #[test]
    fn test_select_is_one_based() {
        let mut b = ballot();
        b.select(1).unwrap();
        assert_eq!(b.selected_label(), Some("Yes"));
        assert_eq!(b.request("tolena.eth").choice, Some(1));

        assert!(matches!(b.select(0), Err(VoteError::InvalidChoice { .. })));
        assert!(matches!(b.select(3), Err(VoteError::InvalidChoice { available: 2, .. })));
        assert_eq!(b.selected(), Some(1));
    }

    #[test]
    fn test_progress_text() {
        assert_eq!(progress_text(VoteFlowState::Signing), Some(SUBMITTING_TEXT));
        assert_eq!(progress_text(VoteFlowState::Submitting), Some(SUBMITTING_TEXT));
        assert_eq!(progress_text(VoteFlowState::Done), None);
    }

    #[test]
    fn test_progress_line_once_per_run() {
        use VoteFlowState::*;
        let mut line = ProgressLine::default();
        let shown: Vec<_> = [Idle, ChainChecking, Signing, Submitting, Done]
            .into_iter()
            .filter_map(|s| line.update(s))
            .collect();
        assert_eq!(shown, vec![SUBMITTING_TEXT]);

        assert_eq!(line.update(Idle), None);
        assert_eq!(line.update(Signing), Some(SUBMITTING_TEXT));
    }
}
