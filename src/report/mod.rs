//! Rich-text documents shown to the user
//!
//! Two documents exist: the analysis summary produced once per story and
//! the answer envelope produced per question. Both are rendered with
//! Handlebars, either as HTML fragments or as Markdown.

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ontology::{ConceptCategories, CulturalContext, GraphStats};
use crate::physics::PhysicsReport;
use crate::utils::capitalize;

const ANALYSIS_HTML: &str = include_str!("../../templates/analysis.html.hbs");
const ANALYSIS_MARKDOWN: &str = include_str!("../../templates/analysis.md.hbs");
const ANSWER_HTML: &str = include_str!("../../templates/answer.html.hbs");
const ANSWER_MARKDOWN: &str = include_str!("../../templates/answer.md.hbs");

/// Report rendering errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Output markup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    #[default]
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

#[derive(Debug, Serialize)]
struct PhysicsSection {
    valid: bool,
    details: String,
}

#[derive(Debug, Serialize)]
struct AnalysisData {
    physics: Option<PhysicsSection>,
    entities: Vec<String>,
    objects: Vec<String>,
    culture: String,
    total_nodes: usize,
    total_edges: usize,
    depth: u8,
    has_edges: bool,
}

#[derive(Debug, Serialize)]
struct AnswerData<'a> {
    text: &'a str,
    referenced: String,
}

/// Inputs to the analysis summary
pub struct AnalysisSummary<'a> {
    pub categories: &'a ConceptCategories,
    pub cultural: &'a CulturalContext,
    pub stats: &'a GraphStats,
    pub physics: Option<&'a PhysicsReport>,
}

/// Handlebars renderer for one output format
pub struct ReportRenderer<'a> {
    handlebars: Handlebars<'a>,
    format: ReportFormat,
}

impl std::fmt::Debug for ReportRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRenderer")
            .field("format", &self.format)
            .finish()
    }
}

impl<'a> ReportRenderer<'a> {
    pub fn new(format: ReportFormat) -> Result<Self, ReportError> {
        let mut handlebars = Handlebars::new();
        let (analysis, answer) = match format {
            ReportFormat::Html => (ANALYSIS_HTML, ANSWER_HTML),
            ReportFormat::Markdown => {
                handlebars.register_escape_fn(handlebars::no_escape);
                (ANALYSIS_MARKDOWN, ANSWER_MARKDOWN)
            }
        };
        handlebars
            .register_template_string("analysis", analysis)
            .map_err(Box::new)?;
        handlebars
            .register_template_string("answer", answer)
            .map_err(Box::new)?;

        Ok(Self { handlebars, format })
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Render the per-story summary
    pub fn render_analysis(&self, summary: &AnalysisSummary<'_>) -> Result<String, ReportError> {
        let physics = summary.physics.map(|report| PhysicsSection {
            valid: !report.has_violations(),
            details: match self.format {
                ReportFormat::Html => report.to_html(),
                ReportFormat::Markdown => report.to_text(),
            },
        });

        let data = AnalysisData {
            physics,
            entities: summary.categories.entities.iter().map(|e| capitalize(e)).collect(),
            objects: summary.categories.objects.iter().map(|o| capitalize(o)).collect(),
            culture: summary.cultural.dominant_culture.clone(),
            total_nodes: summary.stats.total_nodes,
            total_edges: summary.stats.total_edges,
            depth: summary.stats.depth,
            has_edges: summary.stats.total_edges > 0,
        };

        Ok(self.handlebars.render("analysis", &data)?.trim().to_string())
    }

    /// Render an answer with its referenced concepts
    pub fn render_answer(&self, text: &str, referenced: &[String]) -> Result<String, ReportError> {
        let data = AnswerData {
            text,
            referenced: referenced
                .iter()
                .map(|c| capitalize(c))
                .collect::<Vec<_>>()
                .join(", "),
        };
        Ok(self.handlebars.render("answer", &data)?.trim().to_string())
    }
}
