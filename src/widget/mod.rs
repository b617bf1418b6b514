// Voting widget view models
pub mod ballot;
pub mod card;
#[allow(clippy::module_inception)]
pub mod widget;


pub use ballot::{
    progress_text, Ballot, BallotControls, ProgressLine, CONNECT_TO_VOTE_LABEL, SUBMITTED_TEXT,
    SUBMITTING_TEXT, SUBMIT_LABEL,
};
pub use card::{
    format_timestamp, CardAction, ProposalCard, ProposalList, LOAD_ERROR_TEXT, NO_PROPOSALS_TEXT,
};
pub use widget::{
    WalletStatus, Widget, WidgetSettings, CONNECT_WALLET_LABEL, DISCONNECT_LABEL, NO_WALLET_FOUND,
};
