// Domain models for the voting widget
pub mod proposal;
pub mod space;
pub mod vote;

// Re-export commonly used types
pub use proposal::*;
pub use space::*;
pub use vote::*;
