use serde_json::Value;
use thiserror::Error;

use crate::hub::HubError;

/// Errors surfaced by a vote submission.
///
/// The first group are precondition failures shown to the user as-is; the
/// rest are reported with an `Error: ` prefix.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("Please connect your wallet.")]
    NotConnected,

    #[error("Please select a choice.")]
    NoChoice,

    #[error("Network mismatch. Switch to {0} and try again.")]
    NetworkMismatch(String),

    #[error("Wallet provider not found.")]
    NoWallet,

    #[error("Choice {choice} is out of range for a ballot with {available} options")]
    InvalidChoice { choice: u32, available: usize },

    #[error("Signing failed (eth_signTypedData_v4 and personal_sign both failed).")]
    SigningFailed,

    #[error("{0}")]
    Hub(#[from] HubError),

    #[error("Unknown proposal: {0}")]
    UnknownProposal(String),
}

impl VoteError {
    /// Text for the ballot status line.
    pub fn status_text(&self) -> String {
        match self {
            VoteError::NotConnected
            | VoteError::NoChoice
            | VoteError::NetworkMismatch(_)
            | VoteError::NoWallet => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}

/// Best-effort human-readable reason extracted from an arbitrary error value.
///
/// Precedence: plain string, `error.message`, `data.message`, `message`, and
/// finally a compact JSON dump.
pub fn pretty_error(err: &Value) -> String {
    match err {
        Value::Null => "Unknown error".to_string(),
        Value::String(s) => s.clone(),
        _ => {
            let nested = [
                err.pointer("/error/message"),
                err.pointer("/data/message"),
                err.get("message"),
            ];
            nested
                .into_iter()
                .flatten()
                .find_map(non_empty_message)
                .unwrap_or_else(|| err.to_string())
        }
    }
}

fn non_empty_message(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Null | Value::Bool(false) => None,
        Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
