//! Templated answers used when generation is unavailable or unusable
//!
//! Built only from the concept list, cultural context and graph stats.

use serde::{Deserialize, Serialize};

use crate::ontology::{CulturalContext, GraphStats};
use crate::utils::capitalize;

const OVERVIEW_KEYWORDS: &[&str] = &["concept", "concepts", "main", "about"];
const CULTURE_KEYWORDS: &[&str] = &["culture", "cultural", "context"];
const CONNECTION_KEYWORDS: &[&str] = &["connect", "connection", "relationship", "relate"];

/// Concepts named in the generic fallback
const GENERIC_CONCEPTS: usize = 3;

/// Why the fallback was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No generator is configured
    GeneratorUnavailable,
    /// The generator returned an error
    GeneratorError,
    /// The generator output was empty or too short
    OutputTooShort,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneratorUnavailable => "generator_unavailable",
            Self::GeneratorError => "generator_error",
            Self::OutputTooShort => "output_too_short",
        }
    }
}

/// Kind of templated answer, chosen by keywords in the question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    ConceptOverview,
    CulturalContext,
    GraphConnectivity,
    Generic,
}

impl FallbackKind {
    /// Keyword groups are checked in declaration order; first hit wins
    pub fn classify(question: &str) -> Self {
        let q = question.to_lowercase();
        let hit = |words: &[&str]| words.iter().any(|w| q.contains(w));
        if hit(OVERVIEW_KEYWORDS) {
            Self::ConceptOverview
        } else if hit(CULTURE_KEYWORDS) {
            Self::CulturalContext
        } else if hit(CONNECTION_KEYWORDS) {
            Self::GraphConnectivity
        } else {
            Self::Generic
        }
    }
}

fn join_capitalized<'a>(concepts: impl Iterator<Item = &'a String>) -> String {
    concepts.map(|c| capitalize(c)).collect::<Vec<_>>().join(", ")
}

/// Build the templated answer for a question
pub fn fallback_answer(
    question: &str,
    concepts: &[String],
    cultural: &CulturalContext,
    stats: &GraphStats,
) -> String {
    match FallbackKind::classify(question) {
        FallbackKind::ConceptOverview => format!(
            "The main concepts in this story are: {}.",
            join_capitalized(concepts.iter())
        ),
        FallbackKind::CulturalContext => format!(
            "This story has a {} cultural context.",
            cultural.dominant_culture
        ),
        FallbackKind::GraphConnectivity => format!(
            "The knowledge graph shows {} connections between {} concepts. Use the path and neighbors queries to explore them.",
            stats.total_edges, stats.total_nodes
        ),
        FallbackKind::Generic => format!(
            "Based on the story, I can tell you about: {}. The story has {} concept relationships in the knowledge graph.",
            join_capitalized(concepts.iter().take(GENERIC_CONCEPTS)),
            stats.total_edges
        ),
    }
}
