//! Ordered rule collection and severity aggregation

use crate::patterns::KeywordRule;
use crate::rule::{Rule, TriggeredRule};
use crate::social::{ExcessiveEmojis, ExcessiveHashtags, ExcessiveMentions, SuspiciousUrls};
use crate::text::{AllNumbers, ExcessiveCaps, RepeatedCharacters, TooShort};
use serde::Serialize;
use spamgate_core::{Error, Result};
use std::collections::HashSet;
use tracing::debug;

/// Immutable, ordered collection of rules.
///
/// Built once at start-up and shared read-only across decisions.
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Build a rule set from explicit rules, rejecting duplicate names
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name().to_string()) {
                return Err(Error::rule(format!("Duplicate rule name '{}'", rule.name())));
            }
            if rule.severity() == 0 {
                return Err(Error::rule(format!(
                    "Rule '{}' must have a positive severity",
                    rule.name()
                )));
            }
        }

        Ok(Self { rules })
    }

    /// The canonical rule table
    pub fn standard() -> Result<Self> {
        Self::new(standard_rules()?)
    }

    /// Evaluate every rule against `text`
    pub fn evaluate(&self, text: &str) -> RuleEvaluation {
        let triggered: Vec<TriggeredRule> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(text))
            .map(|rule| TriggeredRule::from_rule(rule.as_ref()))
            .collect();

        let total_severity = triggered.iter().map(|r| r.severity).sum();

        debug!(
            total_severity,
            triggered = triggered.len(),
            "Rule evaluation complete"
        );

        RuleEvaluation {
            total_severity,
            triggered,
        }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Look up a rule by name
    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules().find(|r| r.name() == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Fresh instances of the canonical rules, in table order
pub fn standard_rules() -> Result<Vec<Box<dyn Rule>>> {
    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(ExcessiveCaps),
        Box::new(RepeatedCharacters),
        Box::new(ExcessiveEmojis),
        Box::new(SuspiciousUrls::new()?),
        Box::new(KeywordRule::spam_keywords()?),
        Box::new(ExcessiveMentions::new()?),
        Box::new(ExcessiveHashtags::new()?),
        Box::new(KeywordRule::profanity()?),
        Box::new(TooShort),
        Box::new(AllNumbers),
    ];

    Ok(rules)
}

/// Result of evaluating a rule set against one post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleEvaluation {
    /// Sum of the severities of all triggered rules
    pub total_severity: u32,

    /// Triggered rules, in rule-table order
    pub triggered: Vec<TriggeredRule>,
}

impl RuleEvaluation {
    /// Descriptions of the triggered rules, in rule-table order
    pub fn reasons(&self) -> Vec<String> {
        self.triggered.iter().map(|r| r.description.clone()).collect()
    }

    /// Whether the named rule fired
    pub fn triggered(&self, name: &str) -> bool {
        self.triggered.iter().any(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(&'static str, u32);

    impl Rule for Always {
        fn name(&self) -> &str {
            self.0
        }

        fn severity(&self) -> u32 {
            self.1
        }

        fn description(&self) -> &str {
            "always"
        }

        fn matches(&self, _text: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_standard_table_order() {
        let set = RuleSet::standard().unwrap();
        let names: Vec<&str> = set.rules().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "excessive_caps",
                "repeated_characters",
                "excessive_emojis",
                "suspicious_urls",
                "spam_keywords",
                "excessive_mentions",
                "excessive_hashtags",
                "profanity_filter",
                "too_short",
                "all_numbers",
            ]
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Always("a", 1)), Box::new(Always("a", 2))];
        assert!(RuleSet::new(rules).is_err());
    }

    #[test]
    fn test_zero_severity_rejected() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Always("a", 0))];
        assert!(RuleSet::new(rules).is_err());
    }

    #[test]
    fn test_severity_sums() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(Always("a", 2)), Box::new(Always("b", 5))];
        let set = RuleSet::new(rules).unwrap();
        let evaluation = set.evaluate("anything");
        assert_eq!(evaluation.total_severity, 7);
        assert_eq!(evaluation.reasons().len(), 2);
    }

    #[test]
    fn test_clean_post_triggers_nothing() {
        let set = RuleSet::standard().unwrap();
        let evaluation = set.evaluate("Just had a great day at the park! The weather was perfect.");
        assert_eq!(evaluation.total_severity, 0);
        assert!(evaluation.reasons().is_empty());
    }

    #[test]
    fn test_keyword_and_caps_post() {
        let set = RuleSet::standard().unwrap();
        let evaluation = set.evaluate("FREE MONEY!!! CLICK HERE NOW!!!");
        assert!(evaluation.triggered("spam_keywords"));
        assert!(evaluation.triggered("excessive_caps"));
        assert_eq!(evaluation.total_severity, 8);
        assert_eq!(
            evaluation.reasons(),
            vec![
                "Excessive use of capital letters".to_string(),
                "Contains spam keywords".to_string(),
            ]
        );
    }
}
