//! Story concept graph
//!
//! This module turns a short story into a small knowledge graph and answers
//! structural questions about it.
//!
//! # Submodules
//!
//! - [`extractor`] - Ranked concept and proper-noun extraction from story text
//! - [`culture`] - Cultural context detection from a static concept table
//! - [`graph`] - Node/edge model and the graph builder
//! - [`query`] - Relationship lookup, shortest path and neighbourhood queries
//! - [`error`] - Custom error types for ontology operations
//!
//! # Quick Start
//!
//! ```ignore
//! use storyground::ontology::{build_concept_graph, shortest_path, ConceptExtractor};
//! use storyground::relations::RelationMap;
//!
//! let extracted = ConceptExtractor::default().extract(story);
//! let graph = build_concept_graph(&extracted, &RelationMap::new());
//!
//! if let Some(path) = shortest_path(&graph, "knight", "dragon") {
//!     println!("{path}");
//! }
//! ```
//!
//! Graph lookups never fail. An unknown concept yields `None` or an empty
//! list; [`OntologyError`] is reserved for invalid arguments and decoding.

pub mod culture;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod query;

pub use culture::{
    culture_for, detect_cultural_context, CulturalContext, CulturalMarker, UNIVERSAL_CULTURE,
};
pub use error::{OntologyError, OntologyResult};
pub use extractor::{
    extract_concepts, is_stopword, mentioned_concepts, ConceptCategories, ConceptExtractor,
    ExtractedConcepts, DEFAULT_CONCEPT_LIMIT, STOPWORDS,
};
pub use graph::{
    build_concept_graph, concept_id, ConceptEdge, ConceptGraph, ConceptNode, GraphBuilder,
    GraphStats, NodeOrigin, EXTERNAL_NODE_SIZE, STORY_NODE_SIZE,
};
pub use query::{
    neighbors, relationships_for, shortest_path, summarize_concept, ConceptPath, Neighbor,
    Relationship,
};
