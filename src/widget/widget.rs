//! The voting widget: proposal list, inline ballots, wallet panel

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::ballot::{Ballot, BallotControls, SUBMITTED_TEXT};
use super::card::{ProposalCard, ProposalList};
use crate::chains::{resolve_required_network, RequiredNetwork};
use crate::config::{Config, TokenConfig};
use crate::error::VoteError;
use crate::hub::HubClient;
use crate::vote::{VoteFlow, VoteSubmitter};
use crate::wallet::{short_address, WalletConnection, WalletSession};

pub const CONNECT_WALLET_LABEL: &str = "🔗 Connect Wallet";
pub const DISCONNECT_LABEL: &str = "Disconnect";
pub const NO_WALLET_FOUND: &str = "No EVM wallet found. Install MetaMask or Trust Wallet.";

/// Widget options
#[derive(Debug, Clone)]
pub struct WidgetSettings {
    pub space: String,
    pub limit: u32,
    /// Alias or numeric id used when the space declares no network
    pub fallback_network: Option<String>,
    pub app: Option<String>,
    pub metadata: Option<String>,
    pub token: TokenConfig,
    pub enable_vote: bool,
}

impl From<&Config> for WidgetSettings {
    fn from(config: &Config) -> Self {
        Self {
            space: config.space.clone(),
            limit: config.effective_limit(),
            fallback_network: config.network.clone(),
            app: Some(config.app.clone()),
            metadata: None,
            token: config.token.clone(),
            enable_vote: true,
        }
    }
}

/// Wallet panel content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletStatus {
    /// `Connected: 0x1234…abcd • 12.5 TDX`, absent when disconnected
    pub line: Option<String>,
    pub button_label: &'static str,
}

pub struct Widget {
    settings: WidgetSettings,
    hub: HubClient,
    connection: Arc<WalletConnection>,
    required: Option<RequiredNetwork>,
    flow: VoteFlow,
    list: ProposalList,
    listener: Option<JoinHandle<()>>,
}

impl Widget {
    /// Resolve the space's network, load proposals and read the wallet
    pub async fn boot(
        settings: WidgetSettings,
        hub: HubClient,
        connection: Arc<WalletConnection>,
    ) -> Self {
        let space = match hub.fetch_space(&settings.space).await {
            Ok(space) => space,
            Err(e) => {
                warn!(space = settings.space, error = %e, "Space lookup failed, using configured network");
                None
            }
        };

        // A numeric fallback is accepted alongside aliases
        let fallback = settings.fallback_network.clone();
        let required = resolve_required_network(space.as_ref(), fallback.as_deref()).or_else(|| {
            fallback
                .as_deref()
                .and_then(|n| n.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
                .map(RequiredNetwork::new)
        });
        if let Some(network) = &required {
            info!(chain_id = network.id, name = network.name, "Required network");
            if !network.is_known() {
                warn!(chain_id = network.id, "Required network is not in the registry, chain switching is skipped");
            }
        }

        let list = match hub.fetch_active_proposals(&settings.space, settings.limit).await {
            Ok(proposals) => {
                info!(space = settings.space, count = proposals.len(), "Proposals loaded");
                let mut list = ProposalList::from_proposals(&proposals, settings.enable_vote);
                for card in list.cards_mut() {
                    if let Some(ballot) = card.ballot_mut() {
                        *ballot = ballot
                            .clone()
                            .with_overrides(settings.app.clone(), settings.metadata.clone());
                    }
                }
                list
            }
            Err(e) => {
                error!(space = settings.space, error = %e, "Error loading proposals");
                ProposalList::Failed
            }
        };

        let flow = VoteFlow::new(VoteSubmitter::standard(hub.clone()), required.clone());
        connection.refresh().await;
        let listener = connection.spawn_event_listener();

        Self {
            settings,
            hub,
            connection,
            required,
            flow,
            list,
            listener,
        }
    }

    pub fn hub(&self) -> &HubClient {
        &self.hub
    }

    pub fn connection(&self) -> &Arc<WalletConnection> {
        &self.connection
    }

    pub fn flow(&self) -> &VoteFlow {
        &self.flow
    }

    pub fn required_network(&self) -> Option<&RequiredNetwork> {
        self.required.as_ref()
    }

    /// Header note, e.g. `Network: BNB Smart Chain (56)`
    pub fn network_note(&self) -> Option<String> {
        self.required
            .as_ref()
            .map(|n| format!("Network: {} ({})", n.name, n.id))
    }

    pub fn list(&self) -> &ProposalList {
        &self.list
    }

    pub fn session(&self) -> WalletSession {
        self.connection.current()
    }

    fn card(&self, proposal_id: &str) -> Option<&ProposalCard> {
        self.list.cards().iter().find(|c| c.id == proposal_id)
    }

    fn ballot_mut(&mut self, proposal_id: &str) -> Option<&mut Ballot> {
        self.list
            .cards_mut()
            .iter_mut()
            .find(|c| c.id == proposal_id)
            .and_then(|c| c.ballot_mut())
    }

    pub fn ballot(&self, proposal_id: &str) -> Option<&Ballot> {
        self.card(proposal_id).and_then(|c| c.ballot())
    }

    /// Pick a 1-based choice on a ballot
    pub fn select(&mut self, proposal_id: &str, choice: u32) -> Result<(), VoteError> {
        self.ballot_mut(proposal_id)
            .ok_or_else(|| VoteError::UnknownProposal(proposal_id.to_string()))?
            .select(choice)
    }

    /// Submit control state under the latest wallet session
    pub fn controls(&self, proposal_id: &str) -> Option<BallotControls> {
        let session = self.connection.current();
        self.ballot(proposal_id).map(|b| b.controls(&session))
    }

    /// Run the vote flow for one ballot and return its status text
    pub async fn submit(&mut self, proposal_id: &str) -> String {
        let request = match self.ballot(proposal_id) {
            Some(ballot) => ballot.request(&self.settings.space),
            None => return VoteError::UnknownProposal(proposal_id.to_string()).status_text(),
        };

        if let Some(ballot) = self.ballot_mut(proposal_id) {
            ballot.set_busy(true);
        }

        let status = match self.flow.run(&self.connection, &request).await {
            Ok(_) => SUBMITTED_TEXT.to_string(),
            Err(e) => e.status_text(),
        };

        if let Some(ballot) = self.ballot_mut(proposal_id) {
            ballot.set_busy(false);
            ballot.set_status(status.clone());
        }
        self.connection.refresh().await;
        status
    }

    /// Connect button. Returns the alert text when no wallet is present.
    pub async fn connect(&self) -> Result<WalletStatus, String> {
        match self.connection.connect().await {
            Ok(_) => Ok(self.wallet_status().await),
            Err(VoteError::NoWallet) => Err(NO_WALLET_FOUND.to_string()),
            Err(e) => Err(e.status_text()),
        }
    }

    pub async fn disconnect(&self) -> WalletStatus {
        self.connection.disconnect().await;
        self.wallet_status().await
    }

    /// Wallet panel line plus connect/disconnect label
    pub async fn wallet_status(&self) -> WalletStatus {
        let session = self.connection.current();
        let address = match session.address {
            Some(address) => address,
            None => {
                return WalletStatus {
                    line: None,
                    button_label: CONNECT_WALLET_LABEL,
                }
            }
        };

        let mut line = format!("Connected: {}", short_address(&address));
        let balance = self
            .connection
            .token_balance(&self.settings.token, &address, self.required.as_ref().map(|n| n.id))
            .await;
        if let Some(balance) = balance {
            line.push_str(" • ");
            line.push_str(&balance);
        }

        WalletStatus {
            line: Some(line),
            button_label: DISCONNECT_LABEL,
        }
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
