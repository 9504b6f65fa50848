//! Cultural context detection
//!
//! Concepts are looked up in a fixed table mapping well-known story words to
//! the culture they evoke. The most frequent culture among the matches is the
//! story's dominant culture; ties go to the culture matched first.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Culture reported when no concept matches the table
pub const UNIVERSAL_CULTURE: &str = "Universal";

/// Concept to culture lookup table
pub const CULTURAL_CONTEXTS: &[(&str, &str)] = &[
    ("knight", "Western Medieval"),
    ("samurai", "Japanese"),
    ("dragon", "Western/Eastern Mythology"),
    ("temple", "Eastern/Religious"),
    ("castle", "Western Medieval"),
    ("warrior", "Universal"),
    ("monk", "Eastern Religious"),
    ("sword", "Universal Warfare"),
    ("king", "Western Monarchy"),
    ("emperor", "Eastern Monarchy"),
    ("princess", "Western Medieval"),
    ("robot", "Modern Technology"),
    ("computer", "Modern Technology"),
    ("garden", "Universal Nature"),
];

/// Culture associated with a single concept, if the table knows it
pub fn culture_for(concept: &str) -> Option<&'static str> {
    CULTURAL_CONTEXTS
        .iter()
        .find(|(c, _)| *c == concept)
        .map(|(_, culture)| *culture)
}

/// A concept that matched the culture table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CulturalMarker {
    pub concept: String,
    pub culture: String,
}

/// Cultural context derived from a story's concepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CulturalContext {
    /// Most frequent culture among markers
    pub dominant_culture: String,

    /// Matched concepts in concept-list order
    pub markers: Vec<CulturalMarker>,
}

impl Default for CulturalContext {
    fn default() -> Self {
        Self {
            dominant_culture: UNIVERSAL_CULTURE.to_string(),
            markers: Vec::new(),
        }
    }
}

/// Derive the cultural context for a list of concepts
pub fn detect_cultural_context(concepts: &[String]) -> CulturalContext {
    let markers: Vec<CulturalMarker> = concepts
        .iter()
        .filter_map(|c| {
            culture_for(c).map(|culture| CulturalMarker {
                concept: c.clone(),
                culture: culture.to_string(),
            })
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for marker in &markers {
        let count = counts.entry(marker.culture.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(marker.culture.as_str());
        }
        *count += 1;
    }

    // max_by_key keeps the last maximum, so walk in reverse to favour the first.
    let dominant = first_seen
        .iter()
        .rev()
        .max_by_key(|culture| counts[*culture])
        .map(|culture| culture.to_string())
        .unwrap_or_else(|| UNIVERSAL_CULTURE.to_string());

    CulturalContext {
        dominant_culture: dominant,
        markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concepts(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_dragon_story_is_western_medieval() {
        let ctx = detect_cultural_context(&concepts(&[
            "dragon", "attacked", "castle", "knight", "fought", "sword",
        ]));
        assert_eq!(ctx.dominant_culture, "Western Medieval");
        assert_eq!(ctx.markers.len(), 4);
        assert_eq!(ctx.markers[0].concept, "dragon");
    }

    #[test]
    fn test_no_match_is_universal() {
        let ctx = detect_cultural_context(&concepts(&["teapot", "river"]));
        assert_eq!(ctx, CulturalContext::default());
        assert_eq!(ctx.dominant_culture, UNIVERSAL_CULTURE);
    }

    #[test]
    fn test_tie_goes_to_first_match() {
        let ctx = detect_cultural_context(&concepts(&["samurai", "robot"]));
        assert_eq!(ctx.dominant_culture, "Japanese");
    }

    #[test]
    fn test_culture_for() {
        assert_eq!(culture_for("monk"), Some("Eastern Religious"));
        assert_eq!(culture_for("spaceship"), None);
    }
}
