//! storyground - Story question answering grounded in a concept graph
//!
//! Answers questions about a short story by building a concept graph from
//! the text, grounding a language model's prompt in that graph, and auditing
//! the generated answer for fabricated or non-English content.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`ontology`] - Concept extraction, cultural context, graph building and queries
//! - [`relations`] - Relationship lookups (ConceptNet) with caching and bounded fan-out
//! - [`prompt`] - Grounding and retelling prompts
//! - [`llm`] - Text generation through Ollama
//! - [`validation`] - Hallucination gates, language purity and fallback answers
//! - [`physics`] - Physics violation check for stories
//! - [`session`] - Story sessions and their history
//! - [`cache`] - Key-value stores and the answer cache
//! - [`report`] - Analysis summaries and answer documents
//! - [`pipeline`] - Analysis and question phases wired together
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus counters
//! - [`utils`] - Common text helpers
//!
//! # Example
//!
//! ```no_run
//! use storyground::config::Config;
//! use storyground::pipeline::StoryPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = StoryPipeline::from_config(&config).await?;
//!     let session = pipeline.sessions().create().await?;
//!     pipeline
//!         .analyze_story(&session.id, "A dragon attacked a castle. A knight fought the dragon with a sword.")
//!         .await?;
//!     let answer = pipeline
//!         .answer_question(&session.id, "How are knight and dragon connected?")
//!         .await?;
//!     println!("{}", answer.document);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod ontology;
pub mod physics;
pub mod pipeline;
pub mod prompt;
pub mod relations;
pub mod report;
pub mod session;
pub mod utils;
pub mod validation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{KeyValueStore, MemoryStore, StoreExt};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, StoryErrorTrait};
    pub use crate::llm::{Generator, LlmClient};
    pub use crate::ontology::{ConceptGraph, ConceptPath, CulturalContext, GraphStats};
    pub use crate::pipeline::{AnalysisOutcome, AnswerOutcome, StoryPipeline};
    pub use crate::relations::{FetchedRelation, RelationFetcher};
    pub use crate::session::{Session, SessionStore};
    pub use crate::validation::ValidationOutcome;
}

// Direct re-exports for convenience
pub use pipeline::StoryPipeline;
