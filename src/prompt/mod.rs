//! Grounding prompt construction
//!
//! Questions are split into two families by [`QuestionIntent::classify`]:
//!
//! - **Analytical**: the prompt carries the story, a bounded rendering of the
//!   concept graph, the cultural context, any precomputed paths and a rule
//!   set telling the model to answer only from those facts.
//! - **Creative**: a retelling request. The prompt names a target style from
//!   [`RetellingStyle::detect`] and, for three styles, includes a fixed
//!   example retelling to imitate.
//!
//! Building a prompt is pure string composition.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::llm::LlmConfig;
use crate::ontology::{ConceptGraph, ConceptPath, CulturalContext};

mod templates;

pub use templates::{format_cultural_context, format_graph_relationships, format_specific_paths};

/// Substrings that mark a question as a creative retelling, checked in order
pub const CREATIVE_KEYWORDS: &[&str] = &["retell", "rewrite", "tell the story", "narrate", "style"];

/// Whether a question asks for analysis or a creative retelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionIntent {
    Analytical,
    Creative,
}

impl QuestionIntent {
    /// Case-insensitive substring match against [`CREATIVE_KEYWORDS`]
    pub fn classify(question: &str) -> Self {
        let lower = question.to_lowercase();
        if CREATIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Creative
        } else {
            Self::Analytical
        }
    }

    pub fn is_creative(self) -> bool {
        self == Self::Creative
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analytical => "analytical",
            Self::Creative => "creative",
        }
    }

    /// Token budget for this intent
    pub fn max_tokens(self, config: &LlmConfig) -> u32 {
        match self {
            Self::Analytical => config.analytical_max_tokens,
            Self::Creative => config.creative_max_tokens,
        }
    }
}

impl fmt::Display for QuestionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cultural style requested for a retelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetellingStyle {
    Indian,
    Japanese,
    African,
    Chinese,
    Western,
    Modern,
    Ancient,
    Medieval,
    Unknown,
}

impl RetellingStyle {
    /// Styles in match priority order, paired with their keyword
    const KEYWORDS: &'static [(&'static str, RetellingStyle)] = &[
        ("indian", Self::Indian),
        ("japanese", Self::Japanese),
        ("african", Self::African),
        ("chinese", Self::Chinese),
        ("western", Self::Western),
        ("modern", Self::Modern),
        ("ancient", Self::Ancient),
        ("medieval", Self::Medieval),
    ];

    /// First keyword found in the question wins; `Unknown` if none
    pub fn detect(question: &str) -> Self {
        let lower = question.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, style)| *style)
            .unwrap_or(Self::Unknown)
    }

    /// Name used inside the prompt
    pub fn name(self) -> &'static str {
        match self {
            Self::Indian => "Indian",
            Self::Japanese => "Japanese",
            Self::African => "African",
            Self::Chinese => "Chinese",
            Self::Western => "Western",
            Self::Modern => "Modern",
            Self::Ancient => "Ancient",
            Self::Medieval => "Medieval",
            Self::Unknown => "unknown",
        }
    }

    /// Hardcoded example retelling, if this style has one
    pub fn exemplar(self) -> Option<&'static str> {
        match self {
            Self::Japanese => Some(templates::JAPANESE_EXAMPLE),
            Self::Indian => Some(templates::INDIAN_EXAMPLE),
            Self::African => Some(templates::AFRICAN_EXAMPLE),
            _ => None,
        }
    }
}

impl fmt::Display for RetellingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the prompt is built from
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub story: &'a str,
    pub graph: &'a ConceptGraph,
    pub question: &'a str,
    pub cultural: Option<&'a CulturalContext>,
    pub paths: &'a [ConceptPath],
}

/// A built prompt and how the question was classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub intent: QuestionIntent,
    /// Set for creative prompts
    pub style: Option<RetellingStyle>,
}

/// Build the prompt for a question
pub fn build_prompt(request: &PromptRequest<'_>) -> Prompt {
    let intent = QuestionIntent::classify(request.question);
    match intent {
        QuestionIntent::Creative => {
            let style = RetellingStyle::detect(request.question);
            Prompt {
                text: creative_prompt(request.story, style),
                intent,
                style: Some(style),
            }
        }
        QuestionIntent::Analytical => Prompt {
            text: analytical_prompt(request),
            intent,
            style: None,
        },
    }
}

fn creative_prompt(story: &str, style: RetellingStyle) -> String {
    let name = style.name();
    let upper = name.to_uppercase();
    let example = style.exemplar().unwrap_or("");

    format!(
        r#"You are a creative storyteller. Retell the story below in {name} cultural style IN ENGLISH.

ORIGINAL STORY:
{story}

{example}

CRITICAL REQUIREMENTS:
1. Write your ENTIRE retelling in ENGLISH language - NO Hindi, Japanese, Chinese, or other languages
2. CHANGE ALL character names to {name} names (like the example above)
3. CHANGE ALL settings to {name} settings (like the example above)
4. CHANGE ALL weapons/tools to {name} weapons (like the example above)
5. ADD {name} cultural elements (like the example above)
6. Keep the SAME plot: warrior/hero → village threatened → takes weapon → fights threat → defeats it → saves village
7. Write 6-8 complete sentences in English
8. Start with "In ancient..." or "Long ago..." - NO prefixes or headers

REMEMBER: Write in ENGLISH words only. Use {name} NAMES and CULTURAL ELEMENTS but write the story in ENGLISH.

NOW WRITE YOUR {upper} STYLE RETELLING IN ENGLISH:"#
    )
}

fn analytical_prompt(request: &PromptRequest<'_>) -> String {
    let story = request.story;
    let question = request.question;
    let graph_text = format_graph_relationships(request.graph);
    let cultural_text = format_cultural_context(request.cultural);
    let paths_text = format_specific_paths(request.paths);

    format!(
        r#"You are a story analysis assistant. Answer questions using ONLY the story provided.

STORY:
{story}

KNOWLEDGE GRAPH (Concept Relationships):
{graph_text}

{cultural_text}

{paths_text}

USER QUESTION:
{question}

CRITICAL RULES - YOU MUST FOLLOW THESE:
1. Answer ONLY using facts from the story above
2. If something is NOT in the story (like "princess", "queen", specific dates, historical figures), you MUST say: "I don't have information about [X] in this story"
3. Do NOT make up events, characters, or details
4. Do NOT say things like "can be inferred", "might be", "would be", "ruled from", "was known for"
5. If asked "what happens after [event]" and the story doesn't say, respond: "The story ends with [last event]. It doesn't provide details about what happens after."
6. Do NOT add historical information (dates, real rulers, real places) unless they're in the story
7. Keep answer focused and based on story facts (3-5 sentences)

ANSWER (using ONLY information from the story):"#
    )
}
