//! Phrase-list rules backed by Aho-Corasick

use crate::rule::Rule;
use aho_corasick::AhoCorasick;
use spamgate_core::{Error, Result};

/// Phrases typical of unsolicited promotion
pub const SPAM_PHRASES: &[&str] = &[
    "free money",
    "click here",
    "guaranteed",
    "act now",
    "limited time",
    "buy now",
    "make money fast",
    "work from home",
    "earn cash",
    "risk free",
    "no risk",
    "100% free",
    "you have won",
    "double your money",
    "get rich quick",
    "order now",
];

/// Words rejected by the profanity filter
pub const PROFANITY: &[&str] = &[
    "fuck",
    "shit",
    "bitch",
    "asshole",
    "bastard",
    "cunt",
    "dickhead",
    "motherfucker",
];

/// Case-insensitive containment of any phrase from a fixed list
pub struct KeywordRule {
    name: String,
    severity: u32,
    description: String,
    matcher: AhoCorasick,
}

impl KeywordRule {
    /// Create a new keyword rule
    pub fn new(
        name: impl Into<String>,
        severity: u32,
        description: impl Into<String>,
        phrases: &[&str],
    ) -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(phrases)
            .map_err(|e| Error::rule(format!("Failed to build phrase matcher: {}", e)))?;

        Ok(Self {
            name: name.into(),
            severity,
            description: description.into(),
            matcher,
        })
    }

    /// The `spam_keywords` rule
    pub fn spam_keywords() -> Result<Self> {
        Self::new("spam_keywords", 5, "Contains spam keywords", SPAM_PHRASES)
    }

    /// The `profanity_filter` rule
    pub fn profanity() -> Result<Self> {
        Self::new("profanity_filter", 3, "Contains profanity", PROFANITY)
    }
}

impl Rule for KeywordRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> u32 {
        self.severity
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spam_keywords_case_insensitive() {
        let rule = KeywordRule::spam_keywords().unwrap();
        assert!(rule.matches("FREE MONEY!!! CLICK HERE NOW!!!"));
        assert!(rule.matches("Make money fast from home! Work from home guaranteed income!"));
        assert!(!rule.matches("Working on a new project today."));
    }

    #[test]
    fn test_profanity() {
        let rule = KeywordRule::profanity().unwrap();
        assert!(rule.matches("what the SHIT is this"));
        assert!(!rule.matches("Beautiful sunset tonight."));
        assert_eq!(rule.severity(), 3);
        assert_eq!(rule.name(), "profanity_filter");
    }
}
