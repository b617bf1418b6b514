use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use super::graphql::HubClient;
use super::transport::HubError;
use crate::error::pretty_error;
use crate::models::RelayReceipt;

const RELAY_REJECTED: &str = "Relay rejected vote";

impl HubClient {
    /// POST a signed envelope to the relay.
    ///
    /// A non-success status or an `error` member in the reply is a failure;
    /// the relay's own reason is carried verbatim.
    pub async fn submit_message<T>(&self, envelope: &T) -> Result<RelayReceipt, HubError>
    where
        T: Serialize,
    {
        let body = serde_json::to_value(envelope)?;
        let reply = self.transport().post_json(&self.relay_url(), &body).await?;

        // Falsy markers (`null`, `false`, `""`) mean no error
        let reason = match reply.body.get("error") {
            Some(Value::Null) | Some(Value::Bool(false)) | None => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(pretty_error(other)),
        };

        if !reply.is_success() || reason.is_some() {
            error!(status = reply.status, response = %reply.body, "Relay response error");
            return Err(HubError::Relay(
                reason.unwrap_or_else(|| RELAY_REJECTED.to_string()),
            ));
        }

        let receipt: RelayReceipt = serde_json::from_value(reply.body).unwrap_or_default();
        info!(id = ?receipt.id, "Relay accepted message");
        Ok(receipt)
    }
}
