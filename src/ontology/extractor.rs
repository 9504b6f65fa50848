//! Concept extraction from story text
//!
//! This module turns raw story text into a ranked list of salient concept
//! words plus the set of words that look like proper nouns.
//!
//! ## Scoring
//! - frequency of the lowercased word (stop-words and words shorter than 3
//!   letters are ignored)
//! - `+3` if the word appears capitalized somewhere other than the start of a
//!   sentence
//! - `+1` if the word is longer than 6 letters
//!
//! Ties keep the order in which words were first encountered.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use super::error::{OntologyError, OntologyResult};

/// Default number of concepts kept per story
pub const DEFAULT_CONCEPT_LIMIT: usize = 7;

const PROPER_NOUN_BONUS: usize = 3;
const LONG_WORD_BONUS: usize = 1;
const LONG_WORD_LEN: usize = 6;

/// English stop-words ignored by extraction, graph building and validation
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "is", "was", "are", "were", "been", "be", "have",
    "has", "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "can",
    "i", "you", "he", "she", "it", "we", "they", "them", "their", "my", "your", "his", "her",
    "its", "our", "this", "that", "these", "those", "said", "then", "when", "where", "who", "what",
    "which", "how", "there", "here",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Check whether a lowercase word is a stop-word
pub fn is_stopword(word: &str) -> bool {
    stopword_set().contains(word)
}

fn word_regex() -> &'static Regex {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();
    WORD_RE.get_or_init(|| Regex::new(r"\b[A-Za-z]{3,}\b").expect("Invalid regex pattern"))
}

fn sentence_regex() -> &'static Regex {
    static SENTENCE_RE: OnceLock<Regex> = OnceLock::new();
    SENTENCE_RE.get_or_init(|| Regex::new(r"[.!?]+").expect("Invalid regex pattern"))
}

/// Output of concept extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedConcepts {
    /// Ranked concepts, lowercase, at most `limit` entries
    pub concepts: Vec<String>,

    /// Lowercased words seen capitalized mid-sentence
    pub proper_nouns: BTreeSet<String>,
}

impl ExtractedConcepts {
    /// Check whether a concept was recognized as a proper noun
    pub fn is_proper_noun(&self, concept: &str) -> bool {
        self.proper_nouns.contains(concept)
    }

    /// Split concepts into proper-noun entities and everything else
    pub fn categorize(&self) -> ConceptCategories {
        let (entities, objects): (Vec<String>, Vec<String>) = self
            .concepts
            .iter()
            .cloned()
            .partition(|c| self.is_proper_noun(c));
        ConceptCategories { entities, objects }
    }
}

/// Concepts grouped for the analysis summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptCategories {
    /// Concepts that are also proper nouns (characters, places)
    pub entities: Vec<String>,

    /// Remaining concepts
    pub objects: Vec<String>,
}

/// Frequency and capitalization based concept extractor
#[derive(Debug, Clone)]
pub struct ConceptExtractor {
    limit: usize,
}

impl Default for ConceptExtractor {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CONCEPT_LIMIT,
        }
    }
}

impl ConceptExtractor {
    /// Create an extractor keeping at most `limit` concepts
    pub fn new(limit: usize) -> OntologyResult<Self> {
        if limit == 0 {
            return Err(OntologyError::InvalidLimit { limit });
        }
        Ok(Self { limit })
    }

    /// Maximum number of concepts returned
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Extract ranked concepts and proper-noun candidates from text
    pub fn extract(&self, text: &str) -> ExtractedConcepts {
        // Counts in first-encounter order so the sort below can stay stable.
        let mut order: Vec<String> = Vec::new();
        let mut freq: HashMap<String, usize> = HashMap::new();

        for m in word_regex().find_iter(text) {
            let word = m.as_str().to_lowercase();
            if is_stopword(&word) {
                continue;
            }
            let count = freq.entry(word.clone()).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }

        let proper_nouns = find_proper_nouns(text);

        let mut scored: Vec<(String, usize)> = order
            .into_iter()
            .map(|word| {
                let mut score = freq[&word];
                if proper_nouns.contains(&word) {
                    score += PROPER_NOUN_BONUS;
                }
                if word.len() > LONG_WORD_LEN {
                    score += LONG_WORD_BONUS;
                }
                (word, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let concepts = scored
            .into_iter()
            .take(self.limit)
            .map(|(word, _)| word)
            .collect();

        ExtractedConcepts {
            concepts,
            proper_nouns,
        }
    }
}

/// Extract concepts with an explicit limit; a limit of 0 yields no concepts
pub fn extract_concepts(text: &str, limit: usize) -> ExtractedConcepts {
    ConceptExtractor { limit }.extract(text)
}

/// Collect words capitalized anywhere but at the start of a sentence
///
/// Surrounding punctuation is trimmed before the length check, so `"Arthur,"`
/// counts as `arthur` while `"Al,"` is too short to count.
fn find_proper_nouns(text: &str) -> BTreeSet<String> {
    let mut proper_nouns = BTreeSet::new();

    for sentence in sentence_regex().split(text) {
        for (i, raw) in sentence.split_whitespace().enumerate() {
            if i == 0 {
                continue;
            }
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
            let starts_upper = word.chars().next().is_some_and(char::is_uppercase);
            if starts_upper && word.chars().count() > 2 {
                proper_nouns.insert(word.to_lowercase());
            }
        }
    }

    proper_nouns
}

/// Known concepts that occur in the question, in concept-list order
pub fn mentioned_concepts(question: &str, known_concepts: &[String]) -> Vec<String> {
    let question_lower = question.to_lowercase();
    known_concepts
        .iter()
        .filter(|c| question_lower.contains(&c.to_lowercase()))
        .cloned()
        .collect()
}
