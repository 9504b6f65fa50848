//! Story physics check
//!
//! Scans a story for passages that break physical laws using a fixed table
//! of case-insensitive rules grouped into ten categories. A rule may carry an
//! exclusion pattern; the match is dropped when the exclusion occurs anywhere
//! on the rest of the same line.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters of surrounding text kept on each side of a match
pub const CONTEXT_CHARS: usize = 50;

/// Rule category, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsCategory {
    Gravity,
    Energy,
    Mass,
    Thermodynamics,
    Relativity,
    Momentum,
    Materials,
    Biology,
    Planetary,
    Quantum,
}

impl PhysicsCategory {
    pub const ALL: [PhysicsCategory; 10] = [
        Self::Gravity,
        Self::Energy,
        Self::Mass,
        Self::Thermodynamics,
        Self::Relativity,
        Self::Momentum,
        Self::Materials,
        Self::Biology,
        Self::Planetary,
        Self::Quantum,
    ];

    /// Heading used in reports
    pub fn name(self) -> &'static str {
        match self {
            Self::Gravity => "Gravity Violations",
            Self::Energy => "Conservation of Energy Violations",
            Self::Mass => "Conservation of Mass Violations",
            Self::Thermodynamics => "Thermodynamics Violations",
            Self::Relativity => "Relativity Violations",
            Self::Momentum => "Newton's Laws Violations",
            Self::Materials => "Material Strength Violations",
            Self::Biology => "Biological/Survival Violations",
            Self::Planetary => "Planetary Physics Violations",
            Self::Quantum => "Quantum Physics Violations",
        }
    }
}

struct PhysicsRule {
    category: PhysicsCategory,
    pattern: Regex,
    exclusion: Option<Regex>,
    description: &'static str,
}

macro_rules! rule {
    ($category:expr, $pattern:expr, unless $exclusion:expr, $description:expr) => {
        PhysicsRule {
            category: $category,
            pattern: Regex::new(concat!("(?i)", $pattern))
                .expect(concat!("Invalid physics rule: ", $pattern)),
            exclusion: Some(
                Regex::new(concat!("(?i)", $exclusion))
                    .expect(concat!("Invalid physics exclusion: ", $exclusion)),
            ),
            description: $description,
        }
    };
    ($category:expr, $pattern:expr, $description:expr) => {
        PhysicsRule {
            category: $category,
            pattern: Regex::new(concat!("(?i)", $pattern))
                .expect(concat!("Invalid physics rule: ", $pattern)),
            exclusion: None,
            description: $description,
        }
    };
}

lazy_static! {
    static ref RULES: Vec<PhysicsRule> = {
        use PhysicsCategory::*;
        vec![
            rule!(
                Gravity,
                r"\b(flew|floated|rose|lifted|ascended)\s+(?:up(?:ward)?|into\s+(?:the\s+)?(?:sky|air|ceiling))\b",
                unless r"pulled|pushed|threw|tossed|jumped|rocket|balloon|bird|plane|helicopter",
                "Upward motion without apparent force or mechanism"
            ),
            rule!(
                Gravity,
                r"\b(?:fell|dropped|shot)\s+(?:up(?:ward)?|into\s+(?:the\s+)?(?:sky|air|ceiling))\b",
                "Objects falling upward instead of down"
            ),
            rule!(
                Gravity,
                r"\b(?:gravity|pull)\s+(?:reversed|backwards|upward|inverted)\b",
                "Reversed gravity direction"
            ),
            rule!(
                Gravity,
                r"\b(?:only|just)\s+(?:the\s+)?\w+\s+(?:were?\s+)?(?:affected\s+by|felt|experienced)\s+gravity\b",
                "Selective gravity affecting only certain objects"
            ),
            rule!(
                Gravity,
                r"\b(?:valley|mountain|hill|terrain|land|ground|earth)\s+(?:flew|floated|moved|shifted|rose|lifted)\b",
                "Impossible movement of large terrain features"
            ),
            rule!(
                Energy,
                r"\bwithout\s+(?:any\s+)?(?:fuel|power|battery|batteries|energy|source|electricity|wires)\b.*\b(?:lit\s+up|powered|ran|worked|glowed|shone)\b",
                "Energy appearing from nowhere"
            ),
            rule!(
                Energy,
                r"\b(?:running|spinning|moving|working)\s+(?:for\s+)?(?:\d+\s+)?(?:years?|centuries|forever|continuously|endlessly)\s+(?:without|on\s+its\s+own)\b",
                "Perpetual motion without energy source"
            ),
            rule!(
                Energy,
                r"\b(?:ran|worked|operated)\s+on\s+its\s+own\b",
                "Self-sustaining operation without energy input"
            ),
            rule!(
                Mass,
                r"\b(?:vanished|disappeared|evaporated)\s+(?:without|into\s+(?:thin\s+)?air)\b",
                unless r"magic|illusion|trick",
                "Matter disappearing without explanation"
            ),
            rule!(
                Mass,
                r"\b(?:duplicate|copy|copies|clone|clones|multiplied)\s+(?:popped|appeared|materialized)\b",
                "Matter duplicating spontaneously"
            ),
            rule!(
                Mass,
                r"\bhalf\s+(?:the\s+)?\w+\s+(?:vanished|disappeared|gone)\b",
                "Partial matter disappearance"
            ),
            rule!(
                Thermodynamics,
                r"\b(?:ice|frozen|cold)\b.*\b(?:in\s+(?:the\s+)?(?:sun|heat|fire|hot))\b.*\b(?:froze|colder|freeze|harder)\b",
                "Heat flowing from cold to hot (2nd law violation)"
            ),
            rule!(
                Thermodynamics,
                r"\b(?:instantly|immediately|suddenly|within\s+(?:a\s+)?(?:second|moment))\s+(?:froze|melted|boiled|cooled|heated)\b",
                "Instantaneous temperature change"
            ),
            rule!(
                Thermodynamics,
                r"\b(?:boiled|hot)\b.*\b(?:froze|frozen|ice)\b.*\b(?:flame|fire|burning)\b",
                "Simultaneous contradictory temperatures"
            ),
            rule!(
                Relativity,
                r"\b(?:faster\s+than|overtook|outran)\s+(?:light|beam)\b",
                "Faster-than-light travel"
            ),
            rule!(
                Relativity,
                r"\b(?:clocks?|time)\s+(?:ticked|ran|went|moved)\s+backwards?\b",
                unless r"daylight\s+saving|reset|rewound",
                "Time flowing backwards"
            ),
            rule!(
                Relativity,
                r"\bwalked\s+forward\b.*\bbackwards?\b.*\btime\b",
                "Time direction inconsistency"
            ),
            rule!(
                Momentum,
                r"\b(?:suddenly|just)\s+(?:darted|moved|shot|accelerated)\b.*\b(?:no\s+one|nothing)\s+(?:touched|pushed|pulled)\b",
                "Motion without applied force (Newton's 1st law)"
            ),
            rule!(
                Momentum,
                r"\b(?:fired|shot)\s+(?:a\s+)?(?:cannon|gun|rocket)\b.*\b(?:didn't|did\s+not)\s+(?:move|feel|push|recoil)\b",
                "No recoil from firing projectile (Newton's 3rd law)"
            ),
            rule!(
                Momentum,
                r"\b(?:hit|struck|crashed\s+into)\b.*\b(?:didn't|did\s+not)\s+move\b",
                "No momentum transfer in collision"
            ),
            rule!(
                Materials,
                r"\b(?:steel|iron|metal|concrete|stone)\s+(?:bridge|beam|wall|rod)\s+(?:twisted|bent|folded)\b.*\b(?:clay|soft|gently|easily)\b",
                "Impossible bending of rigid materials"
            ),
            rule!(
                Materials,
                r"\b(?:wooden|small|thin)\s+(?:stool|chair|stick|rod)\s+(?:held|supported)\b.*\b(?:building|elephant|train|truck)\b",
                "Small structure supporting impossibly large load"
            ),
            rule!(
                Biology,
                r"\b(?:underwater|submerged)\s+for\s+(?:\d+\s+)?(?:hours?|days?)\b",
                unless r"submarine|scuba|tank|oxygen",
                "Surviving without oxygen for extended period"
            ),
            rule!(
                Biology,
                r"\b(?:train|truck|car|building)\s+(?:hit|struck|crashed)\b.*\b(?:didn't|did\s+not)\s+(?:move|injure|hurt)\b",
                "Human surviving unsurvivable impact"
            ),
            rule!(
                Biology,
                r"\b(?:crumpled|fell\s+apart)\b.*\b(?:he|she)\s+(?:didn't|did\s+not)\s+move\b",
                "No injury despite catastrophic collision"
            ),
            rule!(
                Planetary,
                r"\b(?:moon|planet|satellite)\s+(?:paused|stopped|drifted|left|departed)\b",
                unless r"orbit",
                "Celestial body leaving stable orbit"
            ),
            rule!(
                Planetary,
                r"\batmosphere\b.*\b(?:blew|moved|shifted|drifted)\b",
                "Entire atmosphere moving independently"
            ),
            rule!(
                Quantum,
                r"\b(?:every\s+time|always)\b.*\b(?:electron|particle|quantum)\b.*\b(?:same\s+place|exact|identical)\b",
                "Deterministic quantum behavior (violates uncertainty principle)"
            ),
            rule!(
                Quantum,
                r"\bwalked\s+(?:into|through)\s+(?:a\s+)?(?:wall|barrier)\b.*\b(?:emerged|came\s+out)\b.*\b(?:without|no)\s+(?:hole|damage)\b",
                "Macroscopic quantum tunneling"
            ),
        ]
    };
}

/// A single rule match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsViolation {
    pub category: PhysicsCategory,
    pub description: String,
    /// Matched text, lowercased
    pub matched_text: String,
    /// Byte range of the match in the story
    pub span: (usize, usize),
    pub context: String,
}

/// All violations found in a story, grouped in category order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsReport {
    pub violations: Vec<PhysicsViolation>,
}

impl PhysicsReport {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn total(&self) -> usize {
        self.violations.len()
    }

    /// Non-empty categories with their violations
    pub fn by_category(&self) -> Vec<(PhysicsCategory, Vec<&PhysicsViolation>)> {
        PhysicsCategory::ALL
            .iter()
            .filter_map(|&category| {
                let found: Vec<_> = self
                    .violations
                    .iter()
                    .filter(|v| v.category == category)
                    .collect();
                (!found.is_empty()).then_some((category, found))
            })
            .collect()
    }

    /// Render as an HTML fragment
    pub fn to_html(&self) -> String {
        if !self.has_violations() {
            return "<p style='color: #2ecc71;'>✅ <strong>No physics violations detected!</strong> Story follows known physical laws.</p>".to_string();
        }

        let mut html = vec![
            format!(
                "<h3 style='color: #e74c3c;'>⚠️ Physics Violations Detected: {}</h3>",
                self.total()
            ),
            "<p>The following violations of fundamental physics laws were found:</p>".to_string(),
        ];

        for (category, found) in self.by_category() {
            let plural = if found.len() > 1 { "s" } else { "" };
            html.push(format!(
                "<h4 style='color: #e67e22;'>{} ({} violation{})</h4>",
                html_escape::encode_text(category.name()),
                found.len(),
                plural
            ));
            html.push("<ul>".to_string());
            for v in found {
                html.push("<li>".to_string());
                html.push(format!(
                    "<strong>{}</strong><br/>",
                    html_escape::encode_text(&v.description)
                ));
                html.push(format!(
                    "<em>Matched text:</em> \"{}\"<br/>",
                    html_escape::encode_text(&v.matched_text)
                ));
                html.push(format!(
                    "<em>Context:</em> <span style='background: #fff3cd; padding: 2px 4px;'>{}</span>",
                    html_escape::encode_text(&v.context)
                ));
                html.push("</li>".to_string());
            }
            html.push("</ul>".to_string());
        }

        html.join("\n")
    }

    /// Plain text rendering for terminals
    pub fn to_text(&self) -> String {
        if !self.has_violations() {
            return "No physics violations detected. Story follows known physical laws.".to_string();
        }

        let mut lines = vec![format!("Physics violations detected: {}", self.total())];
        for (category, found) in self.by_category() {
            lines.push(format!("\n{} ({})", category.name(), found.len()));
            for v in found {
                lines.push(format!("  - {}", v.description));
                lines.push(format!("    matched: \"{}\"", v.matched_text));
                lines.push(format!("    context: {}", v.context));
            }
        }
        lines.join("\n")
    }
}

/// Text around a byte range, with `...` where it was cut
pub fn context_around(text: &str, start: usize, end: usize, width: usize) -> String {
    let from = if width == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(width - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let to = text[end..]
        .char_indices()
        .nth(width)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let mut context = text[from..to].to_string();
    if from > 0 {
        context.insert_str(0, "...");
    }
    if to < text.len() {
        context.push_str("...");
    }
    context
}

fn rest_of_line(text: &str, from: usize) -> &str {
    let rest = &text[from..];
    match rest.find('\n') {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}

/// Run every rule over the story
pub fn analyze_physics(text: &str) -> PhysicsReport {
    let mut violations = Vec::new();

    for rule in RULES.iter() {
        for m in rule.pattern.find_iter(text) {
            if let Some(exclusion) = &rule.exclusion {
                if exclusion.is_match(rest_of_line(text, m.end())) {
                    continue;
                }
            }
            violations.push(PhysicsViolation {
                category: rule.category,
                description: rule.description.to_string(),
                matched_text: m.as_str().to_lowercase(),
                span: (m.start(), m.end()),
                context: context_around(text, m.start(), m.end(), CONTEXT_CHARS),
            });
        }
    }

    if !violations.is_empty() {
        tracing::info!(count = violations.len(), "Physics violations detected");
    }

    PhysicsReport { violations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_story() {
        let report = analyze_physics("A dragon attacked a castle. A knight fought the dragon with a sword.");
        assert!(!report.has_violations());
        assert!(report.to_html().contains("No physics violations detected!"));
    }

    #[test]
    fn test_terrain_and_upward_motion() {
        let report = analyze_physics("The valley floated upward into the clouds.");
        assert_eq!(report.total(), 2);
        assert!(report.violations.iter().all(|v| v.category == PhysicsCategory::Gravity));
        assert!(report.violations.iter().any(|v| v.matched_text == "valley floated"));
        assert!(report.violations.iter().any(|v| v.matched_text == "floated upward"));
    }

    #[test]
    fn test_case_insensitive() {
        let report = analyze_physics("The Clock Ran Backwards all night.");
        assert_eq!(report.total(), 1);
        assert_eq!(report.violations[0].matched_text, "clock ran backwards");
        assert_eq!(report.violations[0].category, PhysicsCategory::Relativity);
    }

    #[test]
    fn test_exclusion_on_same_line() {
        assert!(!analyze_physics("The clock ran backwards until someone reset it.").has_violations());
        assert!(!analyze_physics("She rose upward, pulled by a rope.").has_violations());
    }

    #[test]
    fn test_exclusion_does_not_cross_lines() {
        let report = analyze_physics("The clock ran backwards.\nLater they reset it.");
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_energy_from_nowhere() {
        let report = analyze_physics("Without any batteries, the lamp glowed all night.");
        assert_eq!(report.total(), 1);
        assert_eq!(report.violations[0].category, PhysicsCategory::Energy);
    }

    #[test]
    fn test_by_category_order() {
        let report = analyze_physics("The moon stopped. The clock ran backwards. The car went faster than light.");
        let categories: Vec<_> = report.by_category().into_iter().map(|(c, _)| c).collect();
        assert_eq!(categories, vec![PhysicsCategory::Relativity, PhysicsCategory::Planetary]);
    }

    #[test]
    fn test_context_window() {
        let prefix = "a".repeat(60);
        let text = format!("{prefix} faster than light {}", "b".repeat(60));
        let report = analyze_physics(&text);
        assert_eq!(report.total(), 1);
        let context = &report.violations[0].context;
        assert!(context.starts_with("..."));
        assert!(context.ends_with("..."));
        assert_eq!(context.chars().count(), 3 + 50 + "faster than light".len() + 50 + 3);
    }

    #[test]
    fn test_context_short_text_untruncated() {
        assert_eq!(context_around("hello world", 6, 11, 50), "hello world");
        assert_eq!(context_around("abcdefg", 3, 4, 2), "...bcdef...");
    }

    #[test]
    fn test_html_escapes_text() {
        let report = analyze_physics("<b>The moon stopped</b>");
        let html = report.to_html();
        assert!(html.contains("Physics Violations Detected: 1"));
        assert!(html.contains("Planetary Physics Violations (1 violation)"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>The"));
    }
}
