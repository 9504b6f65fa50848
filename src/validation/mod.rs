//! Post-generation answer validation and repair
//!
//! Raw generator output runs through a fixed sequence of checks. Any check
//! may replace the whole answer with a fixed refusal and stop:
//!
//! 1. Trim, drop a leading `Answer:` label
//! 2. Off-topic gate: the question is about an unrelated domain the story never mentions
//! 3. Hedging gate: the answer speculates and the question names a word the story lacks
//! 4. Unknown-word density gate (analytical only): many unfamiliar words plus a
//!    fabrication indicator
//! 5. Creative answers only: English purity pass, see [`purity`]
//! 6. Terminal punctuation is added if missing
//! 7. Answers shorter than the configured minimum are refused
//!
//! When generation fails altogether the pipeline uses [`fallback_answer`]
//! instead of generated text, and that text goes through the same checks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::ontology::is_stopword;
use crate::prompt::QuestionIntent;
use crate::utils::{capitalize, ends_with_terminal_punctuation};

pub mod fallback;
pub mod purity;

pub use fallback::{fallback_answer, FallbackKind, FallbackReason};
pub use purity::{enforce_english, foreign_ratio, PurityRejection};

/// Refusal for questions about unrelated domains
pub const OFF_TOPIC_REFUSAL: &str = "I don't have information about that in this story. I can only answer questions based on the story content and knowledge graph. Please ask about the characters, events, or concepts that appear in the story.";

/// Refusal when fabrication is detected but no specific word can be named
pub const GENERIC_REFUSAL: &str = "I don't have that specific information in the story. I can only answer based on what's explicitly mentioned in the story.";

/// Refusal for answers that end up too short
pub const TOO_SHORT_REFUSAL: &str = "I don't have enough information in the story to provide a detailed answer to that question.";

/// Refusal for retellings written in another language
pub const NON_ENGLISH_APOLOGY: &str = "I apologize, but the response was generated in a non-English language. Please try asking the question again. The response should be in English only.";

/// Question terms that mark an unrelated domain
pub const UNRELATED_TERMS: &[&str] = &[
    "president",
    "prime minister",
    "politics",
    "election",
    "government",
    "covid",
    "pandemic",
    "virus",
    "vaccine",
    "internet",
    "website",
    "google",
    "facebook",
    "twitter",
    "iphone",
    "android",
    "computer",
    "laptop",
    "bitcoin",
    "cryptocurrency",
    "stock market",
];

/// Phrases a model uses when it is guessing, matched against the lowercased answer
pub const HEDGING_PHRASES: &[&str] = &[
    "can be inferred",
    "might be called",
    "would be referred to",
    "in other parts of the world",
    "in other regions",
    "is not mentioned in the given story. however",
    "could be",
    "might be",
    "would be",
    "may be",
];

/// Question words never reported as the missing subject
const QUESTION_FILLER: &[&str] = &[
    "what", "who", "where", "when", "tell", "the", "story", "about", "does", "after", "from",
];

/// Question words must be longer than this to be reported as missing from the story
const SUBJECT_LEN_FLOOR: usize = 4;

/// Concepts listed when redirecting
const REDIRECT_CONCEPTS: usize = 5;

lazy_static! {
    static ref ANSWER_WORD: Regex = Regex::new(r"\b[a-z]{4,}\b").expect("Invalid answer word regex");
}

/// Thresholds for the validation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Unknown words tolerated in an analytical answer
    pub unknown_word_threshold: usize,

    /// Words that, with many unknown words, mark an answer as fabricated
    pub fabrication_indicators: Vec<String>,

    /// Minimum characters in a final answer
    pub min_answer_chars: usize,

    /// Minimum characters in a creative answer after foreign scripts are stripped
    pub min_creative_chars: usize,

    /// Largest fraction of non-ASCII characters accepted in a creative answer
    pub max_foreign_ratio: f64,

    /// Generated text shorter than this is replaced by the fallback answer
    pub min_generated_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            unknown_word_threshold: 10,
            fabrication_indicators: ["elizabeth", "queen", "king", "ruled", "celebrated", "music", "dancing"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_answer_chars: 20,
            min_creative_chars: 100,
            max_foreign_ratio: 0.5,
            min_generated_chars: 10,
        }
    }
}

/// How validation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// The (possibly repaired) answer passed every check
    Accepted,
    /// Question about an unrelated domain
    OffTopic,
    /// Fabrication detected; the reply names the missing word
    Redirected,
    /// Fabrication detected; generic refusal
    Blocked,
    /// Answer too short to be useful
    TooShort,
    /// Creative answer not in English
    NonEnglish,
}

impl ValidationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::OffTopic => "off_topic",
            Self::Redirected => "redirected",
            Self::Blocked => "blocked",
            Self::TooShort => "too_short",
            Self::NonEnglish => "non_english",
        }
    }

    /// True if the answer text was replaced by a refusal
    pub fn is_refusal(self) -> bool {
        self != Self::Accepted
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final answer text and how it was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedAnswer {
    pub text: String,
    pub outcome: ValidationOutcome,
}

impl ValidatedAnswer {
    fn refuse(text: impl Into<String>, outcome: ValidationOutcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }
}

/// Ground truth an answer is checked against
#[derive(Debug, Clone, Copy)]
pub struct AnswerContext<'a> {
    /// Full concept list of the story
    pub concepts: &'a [String],
    pub story: &'a str,
    pub question: &'a str,
}

/// Question mentions an unrelated domain and the story mentions none
pub fn is_off_topic(question: &str, story: &str) -> bool {
    let question = question.to_lowercase();
    let story = story.to_lowercase();
    UNRELATED_TERMS.iter().any(|t| question.contains(t))
        && !UNRELATED_TERMS.iter().any(|t| story.contains(t))
}

/// Answer contains a speculative phrase
pub fn contains_hedging(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    HEDGING_PHRASES.iter().any(|p| lower.contains(p))
}

/// First substantive question word that never appears in the story
pub fn missing_subject(question: &str, story: &str) -> Option<String> {
    let story = story.to_lowercase();
    question
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|w| {
            w.chars().count() > SUBJECT_LEN_FLOOR
                && !is_stopword(w)
                && !QUESTION_FILLER.contains(w)
                && !story.contains(w)
        })
        .map(str::to_string)
}

/// Words of four or more letters in the answer that are neither concepts nor stop-words
pub fn unknown_words(answer: &str, concepts: &[String]) -> HashSet<String> {
    let known: HashSet<String> = concepts.iter().map(|c| c.to_lowercase()).collect();
    let lower = answer.to_lowercase();
    ANSWER_WORD
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !known.contains(*w) && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Reply naming the missing word and pointing at the story's concepts
pub fn redirection(word: &str, concepts: &[String]) -> String {
    let focus = concepts
        .iter()
        .take(REDIRECT_CONCEPTS)
        .map(|c| capitalize(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "I don't have information about '{word}' in this story. The story focuses on: {focus}. Please ask about concepts that appear in the story."
    )
}

/// Runs the validation pipeline
#[derive(Debug, Clone, Default)]
pub struct AnswerValidator {
    config: ValidationConfig,
}

impl AnswerValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate and repair a raw answer
    pub fn validate(&self, raw: &str, ctx: &AnswerContext<'_>) -> ValidatedAnswer {
        let intent = QuestionIntent::classify(ctx.question);

        let mut answer = raw.trim();
        if let Some(rest) = answer.strip_prefix("Answer:") {
            answer = rest.trim();
        }

        if is_off_topic(ctx.question, ctx.story) {
            tracing::info!(question = ctx.question, "Off-topic question refused");
            return ValidatedAnswer::refuse(OFF_TOPIC_REFUSAL, ValidationOutcome::OffTopic);
        }

        if contains_hedging(answer) {
            if let Some(word) = missing_subject(ctx.question, ctx.story) {
                tracing::warn!(word = %word, "Speculative answer about a subject missing from the story");
                return ValidatedAnswer::refuse(
                    redirection(&word, ctx.concepts),
                    ValidationOutcome::Redirected,
                );
            }
        }

        if !intent.is_creative() {
            if let Some(refusal) = self.check_fabrication(answer, ctx) {
                return refusal;
            }
        }

        let mut answer = answer.to_string();

        if intent.is_creative() {
            match enforce_english(
                &answer,
                self.config.max_foreign_ratio,
                self.config.min_creative_chars,
            ) {
                Ok(cleaned) => answer = cleaned,
                Err(_) => {
                    return ValidatedAnswer::refuse(NON_ENGLISH_APOLOGY, ValidationOutcome::NonEnglish)
                }
            }
        }

        if !answer.is_empty() && !ends_with_terminal_punctuation(&answer) {
            answer.push('.');
        }

        if answer.chars().count() < self.config.min_answer_chars {
            return ValidatedAnswer::refuse(TOO_SHORT_REFUSAL, ValidationOutcome::TooShort);
        }

        ValidatedAnswer {
            text: answer,
            outcome: ValidationOutcome::Accepted,
        }
    }

    fn check_fabrication(&self, answer: &str, ctx: &AnswerContext<'_>) -> Option<ValidatedAnswer> {
        let unknown = unknown_words(answer, ctx.concepts);
        if unknown.len() <= self.config.unknown_word_threshold {
            return None;
        }

        let lower = answer.to_lowercase();
        let indicator = self
            .config
            .fabrication_indicators
            .iter()
            .find(|i| lower.contains(i.as_str()))?;

        tracing::warn!(
            unknown = unknown.len(),
            indicator = %indicator,
            "Answer looks fabricated"
        );

        Some(match missing_subject(ctx.question, ctx.story) {
            Some(word) => ValidatedAnswer::refuse(
                redirection(&word, ctx.concepts),
                ValidationOutcome::Redirected,
            ),
            None => ValidatedAnswer::refuse(GENERIC_REFUSAL, ValidationOutcome::Blocked),
        })
    }
}
