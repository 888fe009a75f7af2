//! Character-level rules: capitalisation, repetition, length, digits

use crate::rule::Rule;

/// Uppercase letters make up more than 70% of the letters in a post longer
/// than ten characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExcessiveCaps;

impl ExcessiveCaps {
    const RATIO: f64 = 0.7;
    const MIN_LENGTH: usize = 10;
}

impl Rule for ExcessiveCaps {
    fn name(&self) -> &str {
        "excessive_caps"
    }

    fn severity(&self) -> u32 {
        3
    }

    fn description(&self) -> &str {
        "Excessive use of capital letters"
    }

    fn matches(&self, text: &str) -> bool {
        if text.chars().count() <= Self::MIN_LENGTH {
            return false;
        }

        let (letters, upper) = text
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .fold((0usize, 0usize), |(letters, upper), c| {
                (letters + 1, upper + usize::from(c.is_ascii_uppercase()))
            });

        letters > 0 && upper as f64 / letters as f64 > Self::RATIO
    }
}

/// Any character repeated five or more times in a row.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepeatedCharacters;

impl RepeatedCharacters {
    const RUN: usize = 5;
}

impl Rule for RepeatedCharacters {
    fn name(&self) -> &str {
        "repeated_characters"
    }

    fn severity(&self) -> u32 {
        2
    }

    fn description(&self) -> &str {
        "Repeated characters detected"
    }

    fn matches(&self, text: &str) -> bool {
        let mut previous: Option<char> = None;
        let mut run = 0usize;

        for c in text.chars() {
            // Line terminators break a run
            if matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                previous = None;
                run = 0;
                continue;
            }

            if previous == Some(c) {
                run += 1;
            } else {
                previous = Some(c);
                run = 1;
            }

            if run >= Self::RUN {
                return true;
            }
        }

        false
    }
}

/// Fewer than three characters once surrounding whitespace is removed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TooShort;

impl Rule for TooShort {
    fn name(&self) -> &str {
        "too_short"
    }

    fn severity(&self) -> u32 {
        1
    }

    fn description(&self) -> &str {
        "Post is too short"
    }

    fn matches(&self, text: &str) -> bool {
        text.trim().chars().count() < 3
    }
}

/// Once punctuation and whitespace are stripped, only digits remain.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllNumbers;

impl Rule for AllNumbers {
    fn name(&self) -> &str {
        "all_numbers"
    }

    fn severity(&self) -> u32 {
        2
    }

    fn description(&self) -> &str {
        "Post contains only numbers"
    }

    fn matches(&self, text: &str) -> bool {
        let mut alphanumeric = text.chars().filter(|c| c.is_ascii_alphanumeric()).peekable();

        alphanumeric.peek().is_some() && alphanumeric.all(|c| c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_counts_letters_only() {
        assert!(ExcessiveCaps.matches("FREE MONEY!!! CLICK HERE NOW!!!"));
        assert!(!ExcessiveCaps.matches("Just had a great day at the park!"));
    }

    #[test]
    fn test_caps_requires_length_over_ten() {
        assert!(!ExcessiveCaps.matches("HELLO THER"));
        assert!(ExcessiveCaps.matches("HELLO THERE"));
    }

    #[test]
    fn test_caps_without_letters() {
        assert!(!ExcessiveCaps.matches("1234567890123"));
    }

    #[test]
    fn test_repeated_characters() {
        assert!(RepeatedCharacters.matches("WOOOOOOOW"));
        assert!(RepeatedCharacters.matches("!!!!!"));
        assert!(!RepeatedCharacters.matches("!!!!"));
        assert!(!RepeatedCharacters.matches("aa\naaa"));
        assert!(RepeatedCharacters.matches("\u{1F389}\u{1F389}\u{1F389}\u{1F389}\u{1F389}"));
    }

    #[test]
    fn test_too_short() {
        assert!(TooShort.matches("  hi  "));
        assert!(!TooShort.matches("hey"));
    }

    #[test]
    fn test_all_numbers() {
        assert!(AllNumbers.matches("1234567890"));
        assert!(AllNumbers.matches("555-123-4567"));
        assert!(!AllNumbers.matches("123abc"));
        assert!(!AllNumbers.matches("!!! ???"));
        assert!(!AllNumbers.matches(""));
    }
}
