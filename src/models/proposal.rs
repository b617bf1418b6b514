use serde::{Deserialize, Deserializer, Serialize};

/// The only proposal state the widget lists
pub const ACTIVE_STATE: &str = "active";

/// Voting system of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VotingType {
    SingleChoice,
    Basic,
    Approval,
    Quadratic,
    RankedChoice,
    Weighted,
    #[serde(other)]
    Other,
}

impl VotingType {
    /// Single-selection systems that can be voted inline
    pub fn is_single_selection(&self) -> bool {
        matches!(self, VotingType::SingleChoice | VotingType::Basic)
    }
}

/// Proposal record as returned by the hub. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Markdown body
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    /// Unix seconds
    #[serde(default)]
    pub start: i64,
    /// Unix seconds
    #[serde(default)]
    pub end: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores: Vec<f64>,
    #[serde(default)]
    pub scores_total: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(rename = "type", default)]
    pub voting_type: Option<VotingType>,
}

impl Proposal {
    pub fn is_active(&self) -> bool {
        self.state == ACTIVE_STATE
    }

    /// Whether an inline ballot can be offered instead of an external link
    pub fn supports_inline_ballot(&self) -> bool {
        self.voting_type
            .map(|t| t.is_single_selection())
            .unwrap_or(false)
            && !self.choices.is_empty()
    }
}

/// Keep only proposals whose state is exactly "active"
pub fn retain_active(proposals: Vec<Proposal>) -> Vec<Proposal> {
    proposals.into_iter().filter(Proposal::is_active).collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
