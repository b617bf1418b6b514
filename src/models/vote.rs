use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Application tag sent when no override is configured
pub const DEFAULT_APP: &str = "snapshot-v2";

/// Domain name used by manually built typed data
pub const MANUAL_DOMAIN_NAME: &str = "Snapshot";

/// Domain of the hub's own vote format
pub const HUB_DOMAIN_NAME: &str = "snapshot";
pub const HUB_DOMAIN_VERSION: &str = "0.1.4";

/// Vote fields chosen by the user, built fresh per submission attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotePayload {
    pub space: String,
    pub proposal: String,
    /// 1-based index into the proposal's choices
    pub choice: u32,
    pub reason: String,
    pub app: String,
    pub metadata: Value,
}

impl VotePayload {
    pub fn new(space: impl Into<String>, proposal: impl Into<String>, choice: u32) -> Self {
        Self {
            space: space.into(),
            proposal: proposal.into(),
            choice,
            reason: String::new(),
            app: DEFAULT_APP.to_string(),
            metadata: json!({}),
        }
    }

    /// Apply per-ballot overrides. Metadata that is not valid JSON becomes `{}`.
    pub fn with_overrides(mut self, app: Option<&str>, metadata: Option<&str>) -> Self {
        if let Some(app) = app.filter(|a| !a.is_empty()) {
            self.app = app.to_string();
        }
        if let Some(raw) = metadata.filter(|m| !m.is_empty()) {
            self.metadata = serde_json::from_str(raw).unwrap_or_else(|_| json!({}));
        }
        self
    }

    /// Stamp the payload with a signer and timestamp
    pub fn into_message(self, from: impl Into<String>, timestamp: i64) -> VoteMessage {
        VoteMessage {
            from: from.into(),
            space: self.space,
            proposal: self.proposal,
            choice: self.choice,
            reason: self.reason,
            app: self.app,
            metadata: self.metadata,
            timestamp,
        }
    }
}

/// The message every signing path shares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteMessage {
    pub from: String,
    pub space: String,
    pub proposal: String,
    pub choice: u32,
    pub reason: String,
    pub app: String,
    pub metadata: Value,
    pub timestamp: i64,
}

impl VoteMessage {
    fn metadata_string(&self) -> String {
        if self.metadata.is_null() {
            "{}".to_string()
        } else {
            self.metadata.to_string()
        }
    }
}

/// A single `{name, type}` entry of an EIP-712 struct definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedField {
    fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// EIP-712 typed data as accepted by `eth_signTypedData_v4`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub domain: Value,
    pub primary_type: String,
    pub message: Value,
}

impl TypedData {
    /// Typed data for the manual signing paths
    pub fn manual_vote(msg: &VoteMessage) -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            "EIP712Domain".to_string(),
            vec![TypedField::new("name", "string")],
        );
        types.insert("Vote".to_string(), vote_fields("string"));

        Self {
            types,
            domain: json!({ "name": MANUAL_DOMAIN_NAME }),
            primary_type: "Vote".to_string(),
            message: json!({
                "from": msg.from,
                "space": msg.space,
                "timestamp": msg.timestamp.to_string(),
                "proposal": msg.proposal,
                "choice": msg.choice,
                "reason": msg.reason,
                "app": msg.app,
                "metadata": msg.metadata_string(),
            }),
        }
    }

    /// Typed data in the hub's own vote format
    pub fn hub_vote(msg: &VoteMessage) -> Self {
        let proposal_type = if is_bytes32_hex(&msg.proposal) {
            "bytes32"
        } else {
            "string"
        };

        let mut types = BTreeMap::new();
        types.insert(
            "EIP712Domain".to_string(),
            vec![
                TypedField::new("name", "string"),
                TypedField::new("version", "string"),
            ],
        );
        types.insert("Vote".to_string(), vote_fields(proposal_type));

        Self {
            types,
            domain: json!({ "name": HUB_DOMAIN_NAME, "version": HUB_DOMAIN_VERSION }),
            primary_type: "Vote".to_string(),
            message: json!({
                "from": msg.from,
                "space": msg.space,
                "timestamp": msg.timestamp,
                "proposal": msg.proposal,
                "choice": msg.choice,
                "reason": msg.reason,
                "app": msg.app,
                "metadata": msg.metadata_string(),
            }),
        }
    }

    /// Struct definitions without the implicit domain type
    pub fn message_types(&self) -> BTreeMap<String, Vec<TypedField>> {
        self.types
            .iter()
            .filter(|(name, _)| name.as_str() != "EIP712Domain")
            .map(|(name, fields)| (name.clone(), fields.clone()))
            .collect()
    }

    /// JSON string passed to the wallet
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn vote_fields(proposal_type: &str) -> Vec<TypedField> {
    vec![
        TypedField::new("from", "address"),
        TypedField::new("space", "string"),
        TypedField::new("timestamp", "uint64"),
        TypedField::new("proposal", proposal_type),
        TypedField::new("choice", "uint32"),
        TypedField::new("reason", "string"),
        TypedField::new("app", "string"),
        TypedField::new("metadata", "string"),
    ]
}

/// True for a 0x-prefixed 32-byte hex string
pub fn is_bytes32_hex(s: &str) -> bool {
    s.len() == 66
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Signed envelope posted to the relay
#[derive(Debug, Clone, Serialize)]
pub struct SignedEnvelope<D> {
    pub address: String,
    pub sig: String,
    pub data: D,
}

/// Relay data for a manually signed vote
#[derive(Debug, Clone, Serialize)]
pub struct ManualVoteData {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: VoteMessage,
}

impl ManualVoteData {
    pub fn new(payload: VoteMessage) -> Self {
        Self {
            kind: "vote",
            payload,
        }
    }
}

/// Relay data in the hub's typed format
#[derive(Debug, Clone, Serialize)]
pub struct TypedVoteData {
    pub domain: Value,
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub message: Value,
}

impl From<&TypedData> for TypedVoteData {
    fn from(typed: &TypedData) -> Self {
        Self {
            domain: typed.domain.clone(),
            types: typed.message_types(),
            message: typed.message.clone(),
        }
    }
}

/// Receipt returned by the relay on success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ipfs: Option<String>,
}
