//! Rule trait and common types

use serde::Serialize;

/// Trait for all rules.
///
/// Implementations must be pure: the same text always yields the same answer
/// and no rule may observe another rule's result.
pub trait Rule: Send + Sync {
    /// Unique rule name
    fn name(&self) -> &str;

    /// Weight added to the total when this rule triggers
    fn severity(&self) -> u32;

    /// Human-readable reason reported when this rule triggers
    fn description(&self) -> &str;

    /// Evaluate the predicate against the post text
    fn matches(&self, text: &str) -> bool;
}

/// A rule that fired during evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredRule {
    pub name: String,
    pub severity: u32,
    pub description: String,
}

impl TriggeredRule {
    pub fn from_rule(rule: &dyn Rule) -> Self {
        Self {
            name: rule.name().to_string(),
            severity: rule.severity(),
            description: rule.description().to_string(),
        }
    }
}
