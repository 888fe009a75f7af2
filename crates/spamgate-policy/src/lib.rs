//! Spamgate Policy
//!
//! The decision pipeline that turns a [`Post`] into a [`Decision`]:
//! origin blocking through the [`IpMatcher`], input validation, weighted rule
//! evaluation, and an optional analyzer override.
//!
//! [`Post`]: spamgate_core::Post
//! [`Decision`]: spamgate_core::Decision

pub mod blocklist;
pub mod engine;
pub mod events;
pub mod origin;

pub use blocklist::{BlockCheck, BlocklistEntries, IpMatcher};
pub use engine::{AnalyzerStatus, DecisionEngine, Outcome, Stage};
pub use events::{AnalyzerFailure, FailureBus};
pub use origin::extract_origin;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::blocklist::IpMatcher;
    pub use crate::engine::{DecisionEngine, Outcome, Stage};
    pub use crate::origin::extract_origin;
}
