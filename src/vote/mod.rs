// Vote submission: signing strategies, relay and the flow state machine
pub mod flow;
pub mod signer;
pub mod snapshot_client;
pub mod strategy;
pub mod submitter;


pub use flow::{VoteFlow, VoteFlowState, VoteRequest};
pub use signer::{SignError, SignMethod, Signature, TypedDataSigner, WalletSigner};
pub use snapshot_client::{ClientError, SnapshotClient, VoteFields};
pub use strategy::{
    LibraryStrategy, ManualSignStrategy, StrategyFailure, StrategyKind, StrategyOutput,
    VoteContext, VoteStrategy,
};
pub use submitter::{SigningResult, VoteOutcome, VoteSubmitter};
