use serde::{Deserialize, Serialize};

/// Network field of a space, reported either as a number or a name/alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkId {
    Number(u64),
    Name(String),
}

/// Space metadata, fetched once per page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub network: Option<NetworkId>,
}
