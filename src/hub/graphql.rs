//! GraphQL client for the voting hub
//!
//! Two queries are issued: a space lookup (to learn the required network)
//! and the listing of active proposals.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::transport::{HubError, HubTransport, ReqwestTransport};
use crate::models::{retain_active, Proposal, Space};

/// Limit used when the caller passes 0
pub const DEFAULT_PROPOSAL_LIMIT: u32 = 20;

const SPACE_QUERY: &str = "query($id:String!){ space(id:$id){ id name network } }";

const ACTIVE_PROPOSALS_QUERY: &str = r#"
      query($space:String!, $limit:Int!){
        proposals(first:$limit, where:{space_in:[$space], state:"active"}, orderBy:"created", orderDirection:desc){
          id title body state start end choices scores scores_total link author type
        }
      }"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SpaceData {
    space: Option<Space>,
}

#[derive(Debug, Deserialize)]
struct ProposalsData {
    #[serde(default)]
    proposals: Option<Vec<Proposal>>,
}

/// Client for one hub deployment
#[derive(Clone)]
pub struct HubClient {
    hub_url: String,
    transport: Arc<dyn HubTransport>,
}

impl HubClient {
    /// Create a client over HTTP. Trailing slashes on the hub URL are ignored.
    pub fn new(hub_url: &str) -> Self {
        Self::with_transport(hub_url, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(hub_url: &str, transport: Arc<dyn HubTransport>) -> Self {
        Self {
            hub_url: hub_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.hub_url)
    }

    pub fn relay_url(&self) -> String {
        format!("{}/api/msg", self.hub_url)
    }

    pub(crate) fn transport(&self) -> &Arc<dyn HubTransport> {
        &self.transport
    }

    /// Run a query and decode its `data` member
    pub async fn query<T>(&self, query: &str, variables: Value) -> Result<T, HubError>
    where
        T: DeserializeOwned,
    {
        let body = json!({ "query": query, "variables": variables });
        let reply = self.transport.post_json(&self.graphql_url(), &body).await?;

        let response: GraphQlResponse = serde_json::from_value(reply.body.clone())?;

        if let Some(errors) = response.errors {
            let joined = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HubError::GraphQl(joined));
        }

        if !reply.is_success() {
            return Err(HubError::Status {
                status: reply.status,
                body: reply.body.to_string(),
            });
        }

        let data = response
            .data
            .ok_or_else(|| HubError::InvalidResponse("missing data".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }

    /// Look up a space; `None` if the hub does not know it
    pub async fn fetch_space(&self, id: &str) -> Result<Option<Space>, HubError> {
        let data: SpaceData = self.query(SPACE_QUERY, json!({ "id": id })).await?;
        debug!(space = id, found = data.space.is_some(), "Space lookup");
        Ok(data.space)
    }

    /// Active proposals of a space, newest first, capped to `limit`.
    ///
    /// The result is re-filtered by state because the hub's own filter is
    /// not always honored.
    pub async fn fetch_active_proposals(
        &self,
        space: &str,
        limit: u32,
    ) -> Result<Vec<Proposal>, HubError> {
        let limit = if limit == 0 {
            DEFAULT_PROPOSAL_LIMIT
        } else {
            limit
        };

        let data: ProposalsData = self
            .query(
                ACTIVE_PROPOSALS_QUERY,
                json!({ "space": space, "limit": limit }),
            )
            .await?;

        let fetched = data.proposals.unwrap_or_default();
        let total = fetched.len();
        let active = retain_active(fetched);
        info!(space = space, fetched = total, active = active.len(), "Loaded proposals");

        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NetworkId;
    use crate::testing::StubTransport;

    const HUB: &str = "https://hub.example.org";

    fn client(transport: &Arc<StubTransport>) -> HubClient {
        HubClient::with_transport("https://hub.example.org//", transport.clone())
    }

    #[test]
    fn test_urls_trim_trailing_slashes() {
        let transport = Arc::new(StubTransport::new());
        let hub = client(&transport);
        assert_eq!(hub.hub_url(), HUB);
        assert_eq!(hub.graphql_url(), "https://hub.example.org/graphql");
        assert_eq!(hub.relay_url(), "https://hub.example.org/api/msg");
    }

    #[tokio::test]
    async fn test_fetch_space() {
        let transport = Arc::new(StubTransport::new().with_reply(
            "https://hub.example.org/graphql",
            200,
            json!({ "data": { "space": { "id": "tolena.eth", "name": "Tolena", "network": "56" } } }),
        ));
        let space = client(&transport).fetch_space("tolena.eth").await.unwrap().unwrap();
        assert_eq!(space.network, Some(NetworkId::Name("56".to_string())));

        let sent = transport.requests();
        assert_eq!(sent[0].1["variables"]["id"], "tolena.eth");
    }

    #[tokio::test]
    async fn test_fetch_active_refilters_and_sends_limit() {
        let transport = Arc::new(StubTransport::new().with_reply(
            "https://hub.example.org/graphql",
            200,
            json!({ "data": { "proposals": [
                { "id": "p1", "title": "One", "state": "active", "start": 1, "end": 2, "choices": ["Yes", "No"], "type": "single-choice" },
                { "id": "p2", "title": "Two", "state": "closed", "start": 1, "end": 2, "choices": ["Yes", "No"], "type": "single-choice" },
                { "id": "p3", "title": "Three", "state": "pending", "start": 1, "end": 2, "choices": [], "type": "basic" }
            ] } }),
        ));

        let proposals = client(&transport)
            .fetch_active_proposals("tolena.eth", 9)
            .await
            .unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].id, "p1");

        let sent = transport.requests();
        assert_eq!(sent[0].1["variables"]["limit"], 9);
        assert_eq!(sent[0].1["variables"]["space"], "tolena.eth");
        assert!(sent[0].1["query"].as_str().unwrap().contains("orderDirection:desc"));
    }

    #[tokio::test]
    async fn test_zero_limit_falls_back_to_default() {
        let transport = Arc::new(StubTransport::new().with_reply(
            "https://hub.example.org/graphql",
            200,
            json!({ "data": { "proposals": [] } }),
        ));
        client(&transport).fetch_active_proposals("tolena.eth", 0).await.unwrap();
        assert_eq!(transport.requests()[0].1["variables"]["limit"], DEFAULT_PROPOSAL_LIMIT);
    }

    #[tokio::test]
    async fn test_graphql_errors_are_joined() {
        let transport = Arc::new(StubTransport::new().with_reply(
            "https://hub.example.org/graphql",
            200,
            json!({ "errors": [ { "message": "bad space" }, { "message": "try again" } ] }),
        ));
        let err = client(&transport)
            .fetch_active_proposals("nope.eth", 9)
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::GraphQl(ref m) if m == "bad space; try again"));
    }

    #[tokio::test]
    async fn test_http_failure_without_errors() {
        let transport = Arc::new(StubTransport::new().with_reply(
            "https://hub.example.org/graphql",
            502,
            json!({ "message": "bad gateway" }),
        ));
        let err = client(&transport).fetch_space("tolena.eth").await.unwrap_err();
        assert!(matches!(err, HubError::Status { status: 502, .. }));
    }
}
