//! Read-only queries over a built concept graph
//!
//! Pathfinding and neighbourhood expansion treat the graph as undirected:
//! every stored edge contributes both directions. Neighbours are visited in
//! edge insertion order, so ties between equally short paths resolve to the
//! route whose edges were inserted first.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use super::graph::{concept_id, ConceptGraph};
use crate::utils::capitalize;

/// Relation label used when an adjacency has no recorded label
const DEFAULT_RELATION: &str = "related";

/// Maximum relationships listed by [`summarize_concept`]
const SUMMARY_LIMIT: usize = 10;

/// A relationship rendered with display labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.source, self.relation, self.target)
    }
}

/// Alternating `[label, "[relation]", label, ...]` route between two concepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptPath(Vec<String>);

impl ConceptPath {
    /// Path steps including relation markers
    pub fn steps(&self) -> &[String] {
        &self.0
    }

    /// Number of edges traversed
    pub fn hops(&self) -> usize {
        self.0.len() / 2
    }

    /// Arrow-joined rendering used in prompts and logs
    pub fn render(&self) -> String {
        self.0.join(" → ")
    }
}

impl fmt::Display for ConceptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A neighbour found by [`neighbors`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub label: String,
    pub relation: String,
    pub distance: usize,
}

/// Undirected view over the edge list
struct Adjacency<'a> {
    neighbors: HashMap<&'a str, Vec<&'a str>>,
    labels: HashMap<(&'a str, &'a str), &'a str>,
}

impl<'a> Adjacency<'a> {
    fn new(graph: &'a ConceptGraph) -> Self {
        let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut labels = HashMap::new();

        for edge in graph.edges() {
            let (s, t) = (edge.source.as_str(), edge.target.as_str());
            neighbors.entry(s).or_default().push(t);
            neighbors.entry(t).or_default().push(s);
            labels.insert((s, t), edge.label.as_str());
            labels.insert((t, s), edge.label.as_str());
        }

        Self { neighbors, labels }
    }

    fn of(&self, id: &str) -> &[&'a str] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn relation(&self, from: &'a str, to: &'a str) -> &'a str {
        self.labels
            .get(&(from, to))
            .copied()
            .unwrap_or(DEFAULT_RELATION)
    }
}

/// All edges touching a concept, in edge order
pub fn relationships_for(graph: &ConceptGraph, concept: &str) -> Vec<Relationship> {
    let id = concept_id(concept);
    graph
        .edges()
        .iter()
        .filter(|e| e.source == id || e.target == id)
        .map(|e| Relationship {
            source: graph.label_for(&e.source),
            relation: e.label.clone(),
            target: graph.label_for(&e.target),
        })
        .collect()
}

/// Shortest undirected path between two concepts by edge count
///
/// Returns `None` if either concept is not a node or no route exists.
pub fn shortest_path(graph: &ConceptGraph, from: &str, to: &str) -> Option<ConceptPath> {
    let start_id = concept_id(from);
    let goal_id = concept_id(to);
    if !graph.contains(&start_id) || !graph.contains(&goal_id) {
        return None;
    }

    let adjacency = Adjacency::new(graph);
    let start = graph.node(&start_id)?.id.as_str();

    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut queue: VecDeque<&str> = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == goal_id {
            let mut route = vec![current];
            let mut cursor = current;
            while let Some(&prev) = parent.get(cursor) {
                route.push(prev);
                cursor = prev;
            }
            route.reverse();
            return Some(render_route(graph, &adjacency, &route));
        }

        for &next in adjacency.of(current) {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

fn render_route<'a>(graph: &ConceptGraph, adjacency: &Adjacency<'a>, route: &[&'a str]) -> ConceptPath {
    let mut steps = Vec::with_capacity(route.len() * 2);
    for (i, id) in route.iter().enumerate() {
        steps.push(graph.label_for(id));
        if let Some(next) = route.get(i + 1) {
            steps.push(format!("[{}]", adjacency.relation(id, next)));
        }
    }
    ConceptPath(steps)
}

/// Concepts within `hops` edges, each reported once at its minimum distance
pub fn neighbors(graph: &ConceptGraph, concept: &str, hops: usize) -> Vec<Neighbor> {
    let id = concept_id(concept);
    let adjacency = Adjacency::new(graph);

    let mut found = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    let Some(node) = graph.node(&id) else {
        return found;
    };
    visited.insert(node.id.as_str());
    queue.push_back((node.id.as_str(), 0));

    while let Some((current, dist)) = queue.pop_front() {
        if dist >= hops {
            continue;
        }
        for &next in adjacency.of(current) {
            if visited.insert(next) {
                found.push(Neighbor {
                    label: graph.label_for(next),
                    relation: adjacency.relation(current, next).to_string(),
                    distance: dist + 1,
                });
                queue.push_back((next, dist + 1));
            }
        }
    }

    found
}

/// Human-readable listing of a concept's relationships
pub fn summarize_concept(graph: &ConceptGraph, concept: &str) -> String {
    let relationships = relationships_for(graph, concept);
    if relationships.is_empty() {
        return format!("No relationships found for '{concept}' in the knowledge graph.");
    }

    let mut lines = vec![format!("Knowledge about '{}':\n", capitalize(concept))];
    for rel in relationships.iter().take(SUMMARY_LIMIT) {
        lines.push(format!("  • {rel}"));
    }
    if relationships.len() > SUMMARY_LIMIT {
        lines.push(format!(
            "  ... and {} more relationships",
            relationships.len() - SUMMARY_LIMIT
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::extractor::ExtractedConcepts;
    use crate::ontology::graph::build_concept_graph;
    use crate::relations::{FetchedRelation, RelationMap};

    fn rel(start: &str, relation: &str, end: &str) -> FetchedRelation {
        FetchedRelation {
            start: start.to_string(),
            end: end.to_string(),
            relation: relation.to_string(),
            weight: 1.0,
        }
    }

    /// knight -CapableOf-> fight <-UsedFor- sword ; dragon -IsA-> monster ; knight -Fights-> dragon
    fn sample_graph() -> ConceptGraph {
        let extracted = ExtractedConcepts {
            concepts: ["dragon", "castle", "knight", "sword"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            proper_nouns: Default::default(),
        };
        let mut relations = RelationMap::new();
        relations.insert("dragon", vec![rel("dragon", "IsA", "monster")]);
        relations.insert(
            "knight",
            vec![rel("knight", "CapableOf", "fight"), rel("knight", "Fights", "dragon")],
        );
        relations.insert("sword", vec![rel("sword", "UsedFor", "fight")]);
        build_concept_graph(&extracted, &relations)
    }

    #[test]
    fn test_relationships_for() {
        let graph = sample_graph();
        let rels = relationships_for(&graph, "Dragon");
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].to_string(), "Dragon --[IsA]--> monster");
        assert_eq!(rels[1].source, "Knight");
    }

    #[test]
    fn test_shortest_path_direct() {
        let graph = sample_graph();
        let path = shortest_path(&graph, "knight", "dragon").unwrap();
        assert_eq!(path.steps(), &["Knight", "[Fights]", "Dragon"]);
        assert_eq!(path.hops(), 1);
        assert_eq!(path.render(), "Knight → [Fights] → Dragon");
    }

    #[test]
    fn test_shortest_path_undirected_multi_hop() {
        let graph = sample_graph();
        let path = shortest_path(&graph, "sword", "monster").unwrap();
        assert_eq!(
            path.steps(),
            &[
                "Sword", "[UsedFor]", "fight", "[CapableOf]", "Knight", "[Fights]", "Dragon",
                "[IsA]", "monster"
            ]
        );
        assert_eq!(path.hops(), 4);
    }

    #[test]
    fn test_shortest_path_missing_or_unreachable() {
        let graph = sample_graph();
        assert!(shortest_path(&graph, "knight", "unicorn").is_none());
        // castle is a node but has no edges
        assert!(shortest_path(&graph, "knight", "castle").is_none());
    }

    #[test]
    fn test_shortest_path_to_self() {
        let graph = sample_graph();
        let path = shortest_path(&graph, "castle", "castle").unwrap();
        assert_eq!(path.steps(), &["Castle"]);
        assert_eq!(path.hops(), 0);
    }

    #[test]
    fn test_neighbors_one_hop() {
        let graph = sample_graph();
        let found = neighbors(&graph, "knight", 1);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|n| n.distance == 1));
        assert_eq!(found[0].label, "fight");
        assert_eq!(found[0].relation, "CapableOf");
    }

    #[test]
    fn test_neighbors_two_hops_reports_min_distance() {
        let graph = sample_graph();
        let found = neighbors(&graph, "knight", 2);
        let labels: Vec<_> = found.iter().map(|n| (n.label.as_str(), n.distance)).collect();
        assert_eq!(
            labels,
            vec![("fight", 1), ("Dragon", 1), ("Sword", 2), ("monster", 2)]
        );
    }

    #[test]
    fn test_neighbors_unknown_concept() {
        let graph = sample_graph();
        assert!(neighbors(&graph, "unicorn", 3).is_empty());
    }

    #[test]
    fn test_self_loop_does_not_shorten_paths() {
        let extracted = ExtractedConcepts {
            concepts: vec!["echo".to_string(), "cave".to_string()],
            proper_nouns: Default::default(),
        };
        let mut relations = RelationMap::new();
        relations.insert(
            "echo",
            vec![rel("echo", "RelatedTo", "echo"), rel("echo", "AtLocation", "cave")],
        );
        let graph = build_concept_graph(&extracted, &relations);
        let path = shortest_path(&graph, "echo", "cave").unwrap();
        assert_eq!(path.hops(), 1);
        assert_eq!(neighbors(&graph, "echo", 1).len(), 1);
    }

    #[test]
    fn test_summarize_concept() {
        let graph = sample_graph();
        let summary = summarize_concept(&graph, "knight");
        assert!(summary.starts_with("Knowledge about 'Knight':"));
        assert!(summary.contains("  • Knight --[Fights]--> Dragon"));

        let empty = summarize_concept(&graph, "castle");
        assert_eq!(
            empty,
            "No relationships found for 'castle' in the knowledge graph."
        );
    }
}
