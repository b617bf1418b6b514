use chrono::{DateTime, Local};

use super::ballot::Ballot;
use crate::models::Proposal;

pub const NO_PROPOSALS_TEXT: &str = "No active proposals.";
pub const LOAD_ERROR_TEXT: &str = "Error loading proposals.";

/// What a card offers besides its summary
#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    Ballot(Ballot),
    /// Vote on the hub's own site
    ExternalLink,
}

/// View model of one proposal
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalCard {
    pub id: String,
    pub title: String,
    pub badge: &'static str,
    pub start: String,
    pub end: String,
    pub link: String,
    pub action: CardAction,
}

impl ProposalCard {
    pub fn from_proposal(proposal: &Proposal, enable_vote: bool) -> Self {
        let action = if enable_vote && proposal.supports_inline_ballot() {
            CardAction::Ballot(Ballot::new(&proposal.id, proposal.choices.clone()))
        } else {
            CardAction::ExternalLink
        };

        Self {
            id: proposal.id.clone(),
            title: proposal.title.clone(),
            badge: "active",
            start: format_timestamp(proposal.start),
            end: format_timestamp(proposal.end),
            link: proposal.link.clone(),
            action,
        }
    }

    pub fn ballot(&self) -> Option<&Ballot> {
        match &self.action {
            CardAction::Ballot(b) => Some(b),
            CardAction::ExternalLink => None,
        }
    }

    pub fn ballot_mut(&mut self) -> Option<&mut Ballot> {
        match &mut self.action {
            CardAction::Ballot(b) => Some(b),
            CardAction::ExternalLink => None,
        }
    }
}

/// Content of the proposal list area
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalList {
    Cards(Vec<ProposalCard>),
    Empty,
    Failed,
}

impl ProposalList {
    pub fn from_proposals(proposals: &[Proposal], enable_vote: bool) -> Self {
        if proposals.is_empty() {
            return ProposalList::Empty;
        }
        ProposalList::Cards(
            proposals
                .iter()
                .map(|p| ProposalCard::from_proposal(p, enable_vote))
                .collect(),
        )
    }

    pub fn cards(&self) -> &[ProposalCard] {
        match self {
            ProposalList::Cards(cards) => cards,
            _ => &[],
        }
    }

    pub fn cards_mut(&mut self) -> &mut [ProposalCard] {
        match self {
            ProposalList::Cards(cards) => cards,
            _ => &mut [],
        }
    }

    /// Plain text shown instead of cards
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            ProposalList::Cards(_) => None,
            ProposalList::Empty => Some(NO_PROPOSALS_TEXT),
            ProposalList::Failed => Some(LOAD_ERROR_TEXT),
        }
    }
}

/// Local date-time for unix seconds; out-of-range values render raw
pub fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proposal(id: &str, voting_type: &str, choices: &[&str]) -> Proposal {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("Proposal {}", id),
            "state": "active",
            "start": 1700000000,
            "end": 1700600000,
            "choices": choices,
            "link": format!("https://snapshot.org/#/tolena.eth/proposal/{}", id),
            "type": voting_type
        }))
        .unwrap()
    }

    #[test]
    fn test_single_choice_gets_ballot() {
        let card = ProposalCard::from_proposal(&proposal("p1", "single-choice", &["Yes", "No"]), true);
        let ballot = card.ballot().unwrap();
        assert_eq!(ballot.choices, vec!["Yes", "No"]);
        assert_eq!(card.badge, "active");
    }

    #[test]
    fn test_other_types_link_out() {
        let card = ProposalCard::from_proposal(&proposal("p2", "ranked-choice", &["A", "B"]), true);
        assert_eq!(card.action, CardAction::ExternalLink);
        assert!(card.link.ends_with("/p2"));

        let disabled = ProposalCard::from_proposal(&proposal("p3", "basic", &["A"]), false);
        assert!(disabled.ballot().is_none());
    }

    #[test]
    fn test_list_placeholders() {
        assert_eq!(ProposalList::from_proposals(&[], true).placeholder(), Some(NO_PROPOSALS_TEXT));
        assert_eq!(ProposalList::Failed.placeholder(), Some(LOAD_ERROR_TEXT));
        assert!(ProposalList::Failed.cards().is_empty());

        let list = ProposalList::from_proposals(&[proposal("p1", "basic", &["A"])], true);
        assert_eq!(list.placeholder(), None);
        assert_eq!(list.cards().len(), 1);
    }

    #[test]
    fn test_format_timestamp() {
        assert_ne!(format_timestamp(1700000000), "1700000000");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }
}
