//! Social-media markup rules: emojis, links, mentions, hashtags

use crate::rule::Rule;
use regex::Regex;
use spamgate_core::{Error, Result};

/// Length under which a handful of emojis or hashtags already counts as noise
const SHORT_POST: usize = 50;

/// Link shorteners that hide the real destination
const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "short.link",
    "rebrand.ly",
];

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::rule(format!("Failed to compile '{}': {}", pattern, e)))
}

/// Whether a character falls in one of the pictographic blocks
fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F600..=0x1F64F // emoticons
            | 0x1F300..=0x1F5FF // symbols and pictographs
            | 0x1F680..=0x1F6FF // transport and map
            | 0x1F1E0..=0x1F1FF // regional indicators
            | 0x1F900..=0x1F9FF // supplemental symbols
            | 0x2600..=0x26FF // miscellaneous symbols
            | 0x2700..=0x27BF // dingbats
    )
}

/// More than five emojis, or more than two in a post under fifty characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcessiveEmojis;

impl Rule for ExcessiveEmojis {
    fn name(&self) -> &str {
        "excessive_emojis"
    }

    fn severity(&self) -> u32 {
        2
    }

    fn description(&self) -> &str {
        "Excessive emoji usage"
    }

    fn matches(&self, text: &str) -> bool {
        let emojis = text.chars().filter(|c| is_emoji(*c)).count();
        emojis > 5 || (emojis > 2 && text.chars().count() < SHORT_POST)
    }
}

/// More than two links, or any link through a shortener or over 100 characters.
pub struct SuspiciousUrls {
    url_regex: Regex,
}

impl SuspiciousUrls {
    const MAX_URLS: usize = 2;
    const MAX_URL_LENGTH: usize = 100;

    pub fn new() -> Result<Self> {
        Ok(Self {
            url_regex: compile(r"https?://\S+")?,
        })
    }
}

impl Rule for SuspiciousUrls {
    fn name(&self) -> &str {
        "suspicious_urls"
    }

    fn severity(&self) -> u32 {
        5
    }

    fn description(&self) -> &str {
        "Suspicious or shortened URLs"
    }

    fn matches(&self, text: &str) -> bool {
        let urls: Vec<&str> = self.url_regex.find_iter(text).map(|m| m.as_str()).collect();

        if urls.len() > Self::MAX_URLS {
            return true;
        }

        urls.iter().any(|url| {
            let lower = url.to_lowercase();
            SHORTENER_DOMAINS.iter().any(|domain| lower.contains(domain))
                || url.chars().count() > Self::MAX_URL_LENGTH
        })
    }
}

/// More than three `@handle` mentions.
pub struct ExcessiveMentions {
    mention_regex: Regex,
}

impl ExcessiveMentions {
    pub fn new() -> Result<Self> {
        Ok(Self {
            mention_regex: compile(r"@[A-Za-z0-9_]+")?,
        })
    }
}

impl Rule for ExcessiveMentions {
    fn name(&self) -> &str {
        "excessive_mentions"
    }

    fn severity(&self) -> u32 {
        3
    }

    fn description(&self) -> &str {
        "Excessive mentions"
    }

    fn matches(&self, text: &str) -> bool {
        self.mention_regex.find_iter(text).count() > 3
    }
}

/// More than five hashtags, or more than two in a post under fifty characters.
pub struct ExcessiveHashtags {
    hashtag_regex: Regex,
}

impl ExcessiveHashtags {
    pub fn new() -> Result<Self> {
        Ok(Self {
            hashtag_regex: compile(r"#[A-Za-z0-9_]+")?,
        })
    }
}

impl Rule for ExcessiveHashtags {
    fn name(&self) -> &str {
        "excessive_hashtags"
    }

    fn severity(&self) -> u32 {
        2
    }

    fn description(&self) -> &str {
        "Excessive hashtags"
    }

    fn matches(&self, text: &str) -> bool {
        let hashtags = self.hashtag_regex.find_iter(text).count();
        hashtags > 5 || (hashtags > 2 && text.chars().count() < SHORT_POST)
    }
}
