//! Common utilities and helper functions
//!
//! This module provides shared text helpers used across the application.

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Uppercase the first character and lowercase the rest
///
/// Mirrors how concept labels are displayed: `"DRAGON"` and `"dragon"` both
/// become `"Dragon"`.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Turn a normalized id back into a display label (`"old_man"` -> `"Old Man"`)
pub fn titleize(id: &str) -> String {
    id.replace('_', " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// True if the string ends in `.`, `!` or `?`
pub fn ends_with_terminal_punctuation(text: &str) -> bool {
    text.ends_with(['.', '!', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\nworld"), "hello world");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("dragon"), "Dragon");
        assert_eq!(capitalize("KNIGHT"), "Knight");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_titleize() {
        assert_eq!(titleize("old_man"), "Old Man");
        assert_eq!(titleize("sword"), "Sword");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }

    #[test]
    fn test_terminal_punctuation() {
        assert!(ends_with_terminal_punctuation("Done."));
        assert!(ends_with_terminal_punctuation("Really?"));
        assert!(!ends_with_terminal_punctuation("Not yet"));
        assert!(!ends_with_terminal_punctuation(""));
    }
}
