//! Prompt text blocks

use crate::ontology::{ConceptGraph, ConceptPath, CulturalContext};
use crate::utils::capitalize;

/// Story concepts listed in the graph block
const MAX_STORY_CONCEPTS: usize = 10;

/// Relationship lines listed in the graph block
const MAX_RELATIONSHIPS: usize = 15;

/// Relationship lines per source concept
const MAX_EDGES_PER_SOURCE: usize = 3;

/// Cultural markers listed in the cultural block
const MAX_CULTURAL_MARKERS: usize = 5;

pub(super) const JAPANESE_EXAMPLE: &str = r#"
EXAMPLE Japanese style retelling (use this as a guide):
"Long ago in feudal Japan, a noble samurai warrior named Takeshi lived in a magnificent castle overlooking the mountains. One day, a fearsome dragon emerged from the peaks and threatened a peaceful village below. Takeshi, bound by the code of bushido and his solemn duty to protect the innocent, donned his armor and took his legendary katana sword. With unwavering honor and courage, he rode forth on his black steed to confront the beast. In an epic duel that lasted from dawn to dusk, the samurai fought with masterful skill and discipline. Through the way of the warrior, Takeshi struck down the dragon and saved the village. The grateful villagers honored him as a hero, and his name lived on in legends told by generations."

YOUR TASK: Write a similar retelling using Japanese cultural elements.
"#;

pub(super) const INDIAN_EXAMPLE: &str = r#"
EXAMPLE Indian style retelling (use this as a guide):
"In ancient India, a valiant kshatriya warrior named Arjun lived in a magnificent palace adorned with golden domes. One day, a fearsome naga serpent demon rose from the depths and attacked a peaceful village. Arjun, remembering his sacred dharma to protect the innocent, prepared for battle. He took his blessed khanda sword, said prayers to the gods, and rode forth on his white stallion. With the divine blessings of Lord Vishnu and great courage in his heart, Arjun fought the naga in a legendary battle. After an epic confrontation where good triumphed over evil, Arjun vanquished the demon and saved the villagers. The people celebrated him as a hero chosen by the gods, and peace returned to the land."

YOUR TASK: Write a similar retelling using Indian cultural elements.
"#;

pub(super) const AFRICAN_EXAMPLE: &str = r#"
EXAMPLE African style retelling (use this as a guide):
"In ancient times, a mighty warrior named Kwame lived in a great tribal village surrounded by the savannah. One day, a fearsome beast emerged from the wilderness and threatened his people. Kwame, guided by the wisdom of his ancestors' spirits, prepared for battle. He took his sacred spear blessed by the tribal elders and his sturdy shield. With the strength of the lion and courage of his forefathers, Kwame tracked the beast through the grasslands. In a legendary battle that shook the earth, the warrior fought with honor and skill. Through bravery and the protection of ancestral spirits, Kwame defeated the beast and saved his village. The tribal council honored him with a great feast, and his story was told around fires for generations."

YOUR TASK: Write a similar retelling using African cultural elements.
"#;

/// Render the graph as a bounded list of concepts and relationships
///
/// Lists the first ten story concepts, then at most fifteen relationships
/// grouped by source in order of first appearance, three per source.
pub fn format_graph_relationships(graph: &ConceptGraph) -> String {
    let mut lines = Vec::new();

    let story: Vec<_> = graph.story_nodes().take(MAX_STORY_CONCEPTS).collect();
    if !story.is_empty() {
        lines.push("Main Story Concepts:".to_string());
        for node in story {
            lines.push(format!("  - {}", node.label));
        }
    }

    lines.push("\nConcept Relationships:".to_string());

    let mut sources: Vec<&str> = Vec::new();
    for edge in graph.edges() {
        if !sources.contains(&edge.source.as_str()) {
            sources.push(edge.source.as_str());
        }
    }

    let mut count = 0;
    'sources: for source in sources {
        let source_label = graph.label_for(source);
        let grouped = graph
            .edges()
            .iter()
            .filter(|e| e.source == source)
            .take(MAX_EDGES_PER_SOURCE);
        for edge in grouped {
            if count >= MAX_RELATIONSHIPS {
                break 'sources;
            }
            lines.push(format!(
                "  • {} --[{}]--> {}",
                source_label,
                edge.label,
                graph.label_for(&edge.target)
            ));
            count += 1;
        }
    }

    lines.join("\n")
}

/// Render the dominant culture and up to five markers
pub fn format_cultural_context(context: Option<&CulturalContext>) -> String {
    let Some(context) = context else {
        return String::new();
    };

    let mut lines = vec![
        "CULTURAL CONTEXT:".to_string(),
        format!("Primary cultural context: {}", context.dominant_culture),
    ];

    if !context.markers.is_empty() {
        lines.push("Cultural markers:".to_string());
        for marker in context.markers.iter().take(MAX_CULTURAL_MARKERS) {
            lines.push(format!("  - {}: {}", capitalize(&marker.concept), marker.culture));
        }
    }

    lines.join("\n")
}

/// Render precomputed paths, one per line
pub fn format_specific_paths(paths: &[ConceptPath]) -> String {
    if paths.is_empty() {
        return String::new();
    }

    let mut lines = vec!["SPECIFIC CONNECTIONS:".to_string()];
    for path in paths {
        lines.push(format!("  {}", path.render()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{build_concept_graph, CulturalMarker, ExtractedConcepts};
    use crate::relations::{FetchedRelation, RelationMap};

    fn rel(start: &str, end: &str) -> FetchedRelation {
        FetchedRelation {
            start: start.to_string(),
            end: end.to_string(),
            relation: "RelatedTo".to_string(),
            weight: 1.0,
        }
    }

    fn graph_with_edges(per_source: usize, sources: usize) -> ConceptGraph {
        let concepts: Vec<String> = (0..sources).map(|i| format!("src{i}")).collect();
        let mut relations = RelationMap::new();
        for concept in &concepts {
            let edges = (0..per_source)
                .map(|j| rel(concept, &format!("{concept}tgt{j}")))
                .collect();
            relations.insert(concept.clone(), edges);
        }
        let extracted = ExtractedConcepts {
            concepts,
            proper_nouns: Default::default(),
        };
        build_concept_graph(&extracted, &relations)
    }

    #[test]
    fn test_graph_block_limits() {
        let graph = graph_with_edges(5, 12);
        let text = format_graph_relationships(&graph);

        let concept_lines = text.lines().filter(|l| l.starts_with("  - ")).count();
        let edge_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("  • ")).collect();
        assert_eq!(concept_lines, 10);
        assert_eq!(edge_lines.len(), 15);
        // three per source, five sources
        assert_eq!(edge_lines.iter().filter(|l| l.contains("Src0 ")).count(), 3);
        assert!(!edge_lines.iter().any(|l| l.contains("Src5 ")));
    }

    #[test]
    fn test_graph_block_line_format() {
        let graph = graph_with_edges(1, 1);
        let text = format_graph_relationships(&graph);
        assert!(text.starts_with("Main Story Concepts:\n  - Src0\n\nConcept Relationships:"));
        assert!(text.contains("  • Src0 --[RelatedTo]--> src0tgt0"));
    }

    #[test]
    fn test_cultural_block() {
        let context = CulturalContext {
            dominant_culture: "Western Medieval".to_string(),
            markers: (0..7)
                .map(|i| CulturalMarker {
                    concept: format!("knight{i}"),
                    culture: "Western Medieval".to_string(),
                })
                .collect(),
        };
        let text = format_cultural_context(Some(&context));
        assert!(text.starts_with("CULTURAL CONTEXT:\nPrimary cultural context: Western Medieval"));
        assert_eq!(text.lines().filter(|l| l.starts_with("  - ")).count(), 5);
        assert!(text.contains("  - Knight0: Western Medieval"));
        assert_eq!(format_cultural_context(None), "");
    }

    #[test]
    fn test_paths_block() {
        assert_eq!(format_specific_paths(&[]), "");
    }
}
