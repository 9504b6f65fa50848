//! Property tests for extraction and graph queries

use proptest::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

use storyground::ontology::{
    build_concept_graph, concept_id, extract_concepts, neighbors, shortest_path, ConceptGraph,
    ExtractedConcepts,
};
use storyground::relations::{FetchedRelation, RelationMap};
use storyground::utils::{normalize_whitespace, titleize};

const LABELS: &[&str] = &[
    "dragon", "castle", "knight", "sword", "flame", "tower", "river", "horse",
];
const RELATIONS: &[&str] = &["RelatedTo", "IsA", "AtLocation", "UsedFor"];

fn graph_strategy() -> impl Strategy<Value = ConceptGraph> {
    (
        1..=LABELS.len(),
        prop::collection::vec((0..LABELS.len(), 0..RELATIONS.len(), 0..LABELS.len()), 0..16),
    )
        .prop_map(|(story_count, edges)| {
            let extracted = ExtractedConcepts {
                concepts: LABELS[..story_count].iter().map(|s| s.to_string()).collect(),
                proper_nouns: Default::default(),
            };
            let mut relations = RelationMap::new();
            for (i, (start, rel, end)) in edges.into_iter().enumerate() {
                let concept = LABELS[i % story_count].to_string();
                let mut existing = relations.get(&concept).map(<[_]>::to_vec).unwrap_or_default();
                existing.push(FetchedRelation {
                    start: LABELS[start].to_string(),
                    end: LABELS[end].to_string(),
                    relation: RELATIONS[rel].to_string(),
                    weight: 1.0,
                });
                relations.insert(concept, existing);
            }
            build_concept_graph(&extracted, &relations)
        })
}

/// Plain BFS distances from `start` over the undirected edge list
fn bfs_distances(graph: &ConceptGraph, start: &str) -> HashMap<String, usize> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in graph.edges() {
        adjacency.entry(&edge.source).or_default().push(&edge.target);
        adjacency.entry(&edge.target).or_default().push(&edge.source);
    }

    let mut distances = HashMap::from([(start.to_string(), 0)]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        let dist = distances[current];
        for &next in adjacency.get(current).map(Vec::as_slice).unwrap_or(&[]) {
            if !distances.contains_key(next) {
                distances.insert(next.to_string(), dist + 1);
                queue.push_back(next);
            }
        }
    }
    distances
}

proptest! {
    #[test]
    fn concept_ids_survive_relabelling(label in "[A-Za-z ]{0,24}") {
        let id = concept_id(&label);
        prop_assert_eq!(concept_id(&titleize(&id)), id.clone());
        prop_assert_eq!(concept_id(&id), id);
    }

    #[test]
    fn normalize_whitespace_is_idempotent(text in "[a-z \t\n]{0,60}") {
        let once = normalize_whitespace(&text);
        prop_assert_eq!(normalize_whitespace(&once), once.clone());
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn extraction_is_bounded_distinct_and_deterministic(
        text in "[A-Za-z ,.]{0,200}",
        limit in 0usize..10,
    ) {
        let first = extract_concepts(&text, limit);
        let second = extract_concepts(&text, limit);

        prop_assert!(first.concepts.len() <= limit);
        let unique: HashSet<&String> = first.concepts.iter().collect();
        prop_assert_eq!(unique.len(), first.concepts.len());
        prop_assert!(first.concepts.iter().all(|c| *c == c.to_lowercase()));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn edges_only_join_known_nodes(graph in graph_strategy()) {
        for edge in graph.edges() {
            prop_assert!(graph.contains(&edge.source));
            prop_assert!(graph.contains(&edge.target));
        }
        prop_assert_eq!(graph.stats().total_nodes, graph.nodes().len());
        prop_assert_eq!(graph.stats().total_edges, graph.edges().len());
    }

    #[test]
    fn shortest_path_matches_bfs(graph in graph_strategy(), a in 0..LABELS.len(), b in 0..LABELS.len()) {
        let (from, to) = (LABELS[a], LABELS[b]);
        let path = shortest_path(&graph, from, to);

        if !graph.contains(from) || !graph.contains(to) {
            prop_assert!(path.is_none());
        } else {
            let distances = bfs_distances(&graph, from);
            match distances.get(to) {
                Some(&expected) => {
                    let path = path.expect("reachable concepts have a path");
                    prop_assert_eq!(path.hops(), expected);
                    prop_assert_eq!(path.steps().len(), expected * 2 + 1);
                    let back = shortest_path(&graph, to, from).expect("paths are undirected");
                    prop_assert_eq!(back.hops(), expected);
                }
                None => prop_assert!(path.is_none()),
            }
        }
    }

    #[test]
    fn neighbors_report_minimum_distances(
        graph in graph_strategy(),
        a in 0..LABELS.len(),
        hops in 0usize..4,
    ) {
        let concept = LABELS[a];
        let found = neighbors(&graph, concept, hops);

        if !graph.contains(concept) {
            prop_assert!(found.is_empty());
        } else {
            let distances = bfs_distances(&graph, concept);
            let mut seen = HashSet::new();
            for neighbor in &found {
                let id = concept_id(&neighbor.label);
                prop_assert!(seen.insert(id.clone()), "neighbor reported twice");
                prop_assert_ne!(&id, concept);
                prop_assert!(neighbor.distance >= 1 && neighbor.distance <= hops);
                prop_assert_eq!(distances.get(&id).copied(), Some(neighbor.distance));
            }
            let within = distances.values().filter(|&&d| d >= 1 && d <= hops).count();
            prop_assert_eq!(found.len(), within);
        }
    }
}
