use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// GraphQL `errors` array, messages joined with "; "
    #[error("{0}")]
    GraphQl(String),

    /// Relay rejected the message; carries the relay's own reason
    #[error("{0}")]
    Relay(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Status and decoded JSON body of an HTTP reply
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST-JSON transport to the hub
#[async_trait]
pub trait HubTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, HubError>;
}

/// `reqwest` implementation. No timeout is applied.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HubTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, HubError> {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(url = url, status = %status, "Hub responded");

        let body = serde_json::from_str(&text).map_err(|_| {
            if status.is_success() {
                HubError::InvalidResponse(text.clone())
            } else {
                HubError::Status {
                    status: status.as_u16(),
                    body: text.clone(),
                }
            }
        })?;

        Ok(HttpReply {
            status: status.as_u16(),
            body,
        })
    }
}
