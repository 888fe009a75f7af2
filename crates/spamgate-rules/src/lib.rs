//! Spamgate Rules
//!
//! Stateless predicates over post text, each carrying a fixed severity weight.
//!
//! Rules never depend on each other's results: a [`RuleSet`] evaluates every
//! rule independently, sums the severities of those that trigger and collects
//! their descriptions in table order.

pub mod patterns;
pub mod rule;
pub mod ruleset;
pub mod social;
pub mod text;

pub use patterns::KeywordRule;
pub use rule::{Rule, TriggeredRule};
pub use ruleset::{standard_rules, RuleEvaluation, RuleSet};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::rule::{Rule, TriggeredRule};
    pub use crate::ruleset::{RuleEvaluation, RuleSet};
}
