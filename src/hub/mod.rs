// Hub backend: GraphQL queries and the vote relay
pub mod graphql;
pub mod relay;
pub mod transport;

pub use graphql::{HubClient, DEFAULT_PROPOSAL_LIMIT};
pub use transport::{HttpReply, HubError, HubTransport, ReqwestTransport};
