//! English-only enforcement for creative retellings

use lazy_static::lazy_static;
use regex::Regex;

use crate::utils::{ends_with_terminal_punctuation, normalize_whitespace};

lazy_static! {
    /// Devanagari, Hiragana, Katakana, CJK ideographs and Arabic
    static ref FOREIGN_SCRIPT: Regex = Regex::new(
        r"[\u{0900}-\u{097F}\u{3040}-\u{309F}\u{30A0}-\u{30FF}\u{4E00}-\u{9FFF}\u{0600}-\u{06FF}]+"
    )
    .expect("Invalid foreign script regex");
}

/// Headers the generator tends to put in front of a retelling
pub const BAD_PREFIXES: &[&str] = &[
    "INDIAN STYLE",
    "JAPANESE STYLE",
    "AFRICAN STYLE",
    "CHINESE STYLE",
    "In the land of",
    "Original Story:",
    "Concept Relationships:",
    "Japanese-style retelling",
    "Indian-style retelling",
];

/// Why a retelling was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurityRejection {
    /// Too many characters outside ASCII
    MostlyForeign,
    /// Too little text left once foreign scripts were removed
    TooShortAfterStripping,
}

/// Fraction of characters outside ASCII
pub fn foreign_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let foreign = text.chars().filter(|c| !c.is_ascii()).count();
    foreign as f64 / total as f64
}

/// Remove runs of non-Latin scripts and collapse whitespace
pub fn strip_foreign_scripts(text: &str) -> String {
    let stripped = FOREIGN_SCRIPT.replace_all(text, "");
    normalize_whitespace(&stripped)
}

/// Drop a known header, along with the rest of its first sentence
pub fn strip_bad_prefixes(text: &str) -> String {
    let mut answer = text.to_string();
    for prefix in BAD_PREFIXES {
        if answer.starts_with(prefix) {
            answer = match answer.split_once('.') {
                Some((_, rest)) => rest.trim().to_string(),
                None => answer[prefix.len()..].trim().to_string(),
            };
        }
    }
    answer
}

/// Cut an answer that ends mid-sentence back to its last `.`, `!` or `?`
pub fn truncate_to_last_sentence(text: &str) -> String {
    if text.is_empty() || ends_with_terminal_punctuation(text) {
        return text.to_string();
    }
    match text.rfind(['.', '!', '?']) {
        Some(idx) => text[..=idx].to_string(),
        None => text.to_string(),
    }
}

/// Run the full purity pass over a creative answer
pub fn enforce_english(
    text: &str,
    max_foreign_ratio: f64,
    min_chars: usize,
) -> Result<String, PurityRejection> {
    let ratio = foreign_ratio(text);
    if ratio > max_foreign_ratio {
        tracing::warn!(ratio, "Answer appears to be in a non-English language");
        return Err(PurityRejection::MostlyForeign);
    }

    let stripped = strip_foreign_scripts(text);
    let removed = text.chars().count().saturating_sub(stripped.chars().count());
    if removed > 0 {
        tracing::debug!(removed, "Removed non-English characters from answer");
    }

    if stripped.chars().count() < min_chars {
        tracing::warn!(len = stripped.len(), "Answer was mostly non-English text");
        return Err(PurityRejection::TooShortAfterStripping);
    }

    Ok(truncate_to_last_sentence(&strip_bad_prefixes(&stripped)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH: &str = "Long ago in feudal Japan, a noble samurai named Takeshi lived in a castle. A dragon came from the mountains and he fought it with his katana.";

    #[test]
    fn test_foreign_ratio() {
        assert_eq!(foreign_ratio(""), 0.0);
        assert_eq!(foreign_ratio("abcd"), 0.0);
        assert!((foreign_ratio("ab日本") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mostly_foreign_rejected() {
        // 6 of 10 characters outside ASCII
        let text = "abcd日本語ですね";
        assert!(foreign_ratio(text) > 0.5);
        assert_eq!(enforce_english(text, 0.5, 100), Err(PurityRejection::MostlyForeign));
    }

    #[test]
    fn test_light_contamination_stripped() {
        let text = format!("{ENGLISH} 侍 は 強い");
        assert!(foreign_ratio(&text) < 0.1);
        let cleaned = enforce_english(&text, 0.5, 100).unwrap();
        assert_eq!(cleaned, ENGLISH);
    }

    #[test]
    fn test_short_after_stripping_rejected() {
        let text = "The samurai won. ताकेशी";
        assert_eq!(
            enforce_english(text, 0.5, 100),
            Err(PurityRejection::TooShortAfterStripping)
        );
    }

    #[test]
    fn test_strip_bad_prefix_sentence() {
        assert_eq!(
            strip_bad_prefixes("JAPANESE STYLE RETELLING. Long ago there was a samurai."),
            "Long ago there was a samurai."
        );
        assert_eq!(strip_bad_prefixes("Original Story: no period here"), "no period here");
        assert_eq!(strip_bad_prefixes("Long ago."), "Long ago.");
    }

    #[test]
    fn test_truncate_mid_sentence() {
        assert_eq!(
            truncate_to_last_sentence("The hero won. The village cele"),
            "The hero won."
        );
        assert_eq!(truncate_to_last_sentence("No stop at all"), "No stop at all");
        assert_eq!(truncate_to_last_sentence("Done!"), "Done!");
        assert_eq!(
            truncate_to_last_sentence("The knight won! The village cele"),
            "The knight won!"
        );
        assert_eq!(
            truncate_to_last_sentence("Who fled? The dragon did. Then it"),
            "Who fled? The dragon did."
        );
    }
}
