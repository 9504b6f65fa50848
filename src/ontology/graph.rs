//! Concept graph model and builder
//!
//! Nodes are keyed by a normalized id derived from their label (lowercase,
//! spaces replaced by underscores). Story concepts are inserted first, then
//! both endpoints of every fetched relation; an id that already exists keeps
//! its first node. An edge is kept only if both endpoints resolve to nodes at
//! the time it is processed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::culture::{culture_for, UNIVERSAL_CULTURE};
use super::error::{OntologyError, OntologyResult};
use super::extractor::{is_stopword, ExtractedConcepts};
use crate::relations::RelationMap;
use crate::utils::{capitalize, titleize};

/// Display size hint for nodes extracted from the story
pub const STORY_NODE_SIZE: u32 = 70;

/// Display size hint for nodes introduced by relationship lookup
pub const EXTERNAL_NODE_SIZE: u32 = 50;

/// Normalize a label into a node id
pub fn concept_id(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

/// Where a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOrigin {
    /// Extracted directly from the story text
    Story,
    /// Introduced by an external relationship lookup
    External,
}

/// A concept node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    /// Normalized id, always `concept_id(label)`
    pub id: String,

    /// Display label
    pub label: String,

    /// Story-native or externally related
    pub origin: NodeOrigin,

    /// Importance hint for display
    pub size: u32,

    /// Culture associated with the concept
    pub cultural_tag: String,

    /// Concept was seen capitalized mid-sentence
    #[serde(default)]
    pub proper_noun: bool,
}

impl ConceptNode {
    /// Create a node; the id is derived from the label here and nowhere else
    pub fn new(label: impl Into<String>, origin: NodeOrigin, size: u32) -> Self {
        let label = label.into();
        Self {
            id: concept_id(&label),
            label,
            origin,
            size,
            cultural_tag: UNIVERSAL_CULTURE.to_string(),
            proper_noun: false,
        }
    }

    /// Node for a concept extracted from the story
    pub fn story(concept: &str) -> Self {
        let mut node = Self::new(capitalize(concept), NodeOrigin::Story, STORY_NODE_SIZE);
        node.cultural_tag = culture_for(concept)
            .unwrap_or(UNIVERSAL_CULTURE)
            .to_string();
        node
    }

    /// Node for a label returned by relationship lookup
    pub fn external(label: &str) -> Self {
        Self::new(label, NodeOrigin::External, EXTERNAL_NODE_SIZE)
    }

    /// True for story-origin nodes
    pub fn is_from_story(&self) -> bool {
        self.origin == NodeOrigin::Story
    }
}

/// A directed, labelled relationship between two node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub source: String,
    pub target: String,
    /// Relation label (e.g. `IsA`, `UsedFor`)
    pub label: String,
    pub weight: f64,
}

/// Summary counts over a built graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub story_concept_count: usize,
    pub related_concept_count: usize,
    pub total_edges: usize,
    /// 2 if any edge survived, otherwise 1
    pub depth: u8,
}

impl GraphStats {
    fn compute(nodes: &[ConceptNode], edges: &[ConceptEdge]) -> Self {
        let story = nodes.iter().filter(|n| n.is_from_story()).count();
        Self {
            total_nodes: nodes.len(),
            story_concept_count: story,
            related_concept_count: nodes.len() - story,
            total_edges: edges.len(),
            depth: if edges.is_empty() { 1 } else { 2 },
        }
    }
}

/// Serialized shape of a graph; the id index is rebuilt on load
#[derive(Deserialize)]
struct GraphRecord {
    #[serde(default)]
    nodes: Vec<ConceptNode>,
    #[serde(default)]
    edges: Vec<ConceptEdge>,
}

/// Concept graph with nodes unique by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphRecord")]
pub struct ConceptGraph {
    nodes: Vec<ConceptNode>,
    edges: Vec<ConceptEdge>,
    stats: GraphStats,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl From<GraphRecord> for ConceptGraph {
    fn from(record: GraphRecord) -> Self {
        let mut builder = GraphBuilder::new();
        for node in record.nodes {
            builder.insert_node(node);
        }
        for edge in record.edges {
            builder.push_edge(edge);
        }
        builder.build()
    }
}

impl PartialEq for ConceptGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

impl ConceptGraph {
    /// All nodes in insertion order
    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[ConceptEdge] {
        &self.edges
    }

    /// Summary statistics
    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    /// Look up a node by normalized id
    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Check whether a node id exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Display label for an id, falling back to a titleized id
    pub fn label_for(&self, id: &str) -> String {
        self.node(id)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| titleize(id))
    }

    /// Story-origin nodes in insertion order
    pub fn story_nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.nodes.iter().filter(|n| n.is_from_story())
    }

    /// Externally related nodes in insertion order
    pub fn related_nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.nodes.iter().filter(|n| !n.is_from_story())
    }

    /// True if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> OntologyResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| OntologyError::GraphDecodeFailed {
            reason: e.to_string(),
        })
    }

    /// Deserialize from JSON, rebuilding the id index
    pub fn from_json(json: &str) -> OntologyResult<Self> {
        serde_json::from_str(json).map_err(|e| OntologyError::GraphDecodeFailed {
            reason: e.to_string(),
        })
    }
}

/// Incremental builder enforcing the node and edge invariants
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<ConceptNode>,
    edges: Vec<ConceptEdge>,
    index: HashMap<String, usize>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless its id is already taken; returns true if inserted
    pub fn insert_node(&mut self, node: ConceptNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Append an edge if both endpoints are known; returns true if kept
    pub fn push_edge(&mut self, edge: ConceptEdge) -> bool {
        if self.index.contains_key(&edge.source) && self.index.contains_key(&edge.target) {
            self.edges.push(edge);
            true
        } else {
            false
        }
    }

    /// Add every extracted concept as a story node
    pub fn add_story_concepts(&mut self, extracted: &ExtractedConcepts) -> &mut Self {
        for concept in &extracted.concepts {
            let mut node = ConceptNode::story(concept);
            node.proper_noun = extracted.is_proper_noun(concept);
            self.insert_node(node);
        }
        self
    }

    /// Add fetched relations, creating external nodes for unseen endpoints
    pub fn add_relations(&mut self, relations: &RelationMap) -> &mut Self {
        for (_concept, fetched) in relations.iter() {
            for relation in fetched {
                for label in [&relation.start, &relation.end] {
                    if label.is_empty() || is_stopword(&label.to_lowercase()) {
                        continue;
                    }
                    self.insert_node(ConceptNode::external(label));
                }

                if relation.start.is_empty() || relation.end.is_empty() {
                    continue;
                }
                let kept = self.push_edge(ConceptEdge {
                    source: concept_id(&relation.start),
                    target: concept_id(&relation.end),
                    label: relation.relation.clone(),
                    weight: relation.weight,
                });
                if !kept {
                    tracing::debug!(
                        start = %relation.start,
                        end = %relation.end,
                        "Dropped dangling edge"
                    );
                }
            }
        }
        self
    }

    /// Finish the graph and compute stats
    pub fn build(self) -> ConceptGraph {
        let stats = GraphStats::compute(&self.nodes, &self.edges);
        ConceptGraph {
            nodes: self.nodes,
            edges: self.edges,
            stats,
            index: self.index,
        }
    }
}

/// Build a concept graph from extracted concepts and fetched relations
pub fn build_concept_graph(extracted: &ExtractedConcepts, relations: &RelationMap) -> ConceptGraph {
    let mut builder = GraphBuilder::new();
    builder.add_story_concepts(extracted).add_relations(relations);
    builder.build()
}
