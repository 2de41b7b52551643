//! Search-term hygiene

use regex_lite::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Longest accepted search term, in characters.
pub const MAX_SEARCH_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSearch {
    #[error("Search term too long (max 1000 characters)")]
    TooLong,
    #[error("Invalid characters in search term")]
    Suspicious,
}

fn suspicious_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)script",
            r"(?i)javascript",
            r"(?i)vbscript",
            r"(?i)onload",
            r"(?i)onerror",
            r"<.*>",
            r"(?i)eval\(",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Reject overlong terms and anything that looks like markup or script.
pub fn validate_search_input(input: &str) -> Result<(), InvalidSearch> {
    if input.chars().count() > MAX_SEARCH_LENGTH {
        return Err(InvalidSearch::TooLong);
    }
    if suspicious_patterns().iter().any(|re| re.is_match(input)) {
        return Err(InvalidSearch::Suspicious);
    }
    Ok(())
}

/// Strip `<>'"&`, trim, and cap the length.
pub fn sanitize_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"' | '&'))
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_SEARCH_LENGTH)
        .collect()
}
