// Routing types - queries, workflow labels and the shared report shape

use crate::search::{SearchHit, WebFinding};
use crate::translation::{Backend, TranslationOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user request, plus any hints extracted by the surrounding system
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Query {
    pub text: String,

    #[serde(default)]
    pub hints: QueryHints,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hints: QueryHints::default(),
        }
    }

    /// Pin the storage backend searched for the referenced document
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.hints.backend = Some(backend);
        self
    }
}

/// Optional constraints that narrow how a query is handled
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryHints {
    /// Preferred source language for translation requests
    pub language: Option<String>,

    /// Restrict document resolution to one storage backend
    pub backend: Option<Backend>,
}

/// The routing decision: which handling path a query takes.
/// `Unknown` is never routed; it only exists as the pre-classification
/// state and for diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowLabel {
    Methodology,
    Guidance,
    Research,
    Translate,
    Unknown,
}

impl WorkflowLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowLabel::Methodology => "METHODOLOGY",
            WorkflowLabel::Guidance => "GUIDANCE",
            WorkflowLabel::Research => "RESEARCH",
            WorkflowLabel::Translate => "TRANSLATE",
            WorkflowLabel::Unknown => "UNKNOWN",
        }
    }

    /// What each routable label handles, used in the classifier prompt
    pub fn description(&self) -> &'static str {
        match self {
            WorkflowLabel::Methodology => {
                "questions about audit methodology, procedures, techniques and how work is performed"
            }
            WorkflowLabel::Guidance => {
                "questions about internal guidelines, policies, compliance requirements and governance"
            }
            WorkflowLabel::Research => {
                "general questions needing current information from the public web"
            }
            WorkflowLabel::Translate => {
                "requests to translate a document file into another language"
            }
            WorkflowLabel::Unknown => "not routable",
        }
    }

    /// The four labels a query can actually be routed to
    pub fn routable() -> [WorkflowLabel; 4] {
        [
            WorkflowLabel::Methodology,
            WorkflowLabel::Guidance,
            WorkflowLabel::Research,
            WorkflowLabel::Translate,
        ]
    }
}

impl std::fmt::Display for WorkflowLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow output in the shared report shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportPayload {
    SearchHits(Vec<SearchHit>),
    WebFindings(Vec<WebFinding>),
    Translation(TranslationOutcome),
    Failure { message: String },
}

/// One completed pipeline invocation, ready for the boundary writer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub label: WorkflowLabel,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub payload: ReportPayload,
}

impl WorkflowReport {
    pub fn new(label: WorkflowLabel, query: impl Into<String>, payload: ReportPayload) -> Self {
        Self {
            label,
            query: query.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Render the report as markdown
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Workflow Report\n\n");
        out.push_str(&format!("- Workflow: {}\n", self.label));
        out.push_str(&format!("- Query: {}\n", self.query));
        out.push_str(&format!(
            "- Generated: {}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        match &self.payload {
            ReportPayload::SearchHits(hits) => {
                out.push_str("## Results\n\n");
                if hits.is_empty() {
                    out.push_str("No matching documents found.\n");
                }
                for (i, hit) in hits.iter().enumerate() {
                    out.push_str(&format!(
                        "### {}. {} (score {:.2})\n\n{}\n\n",
                        i + 1,
                        hit.title,
                        hit.score,
                        hit.excerpt
                    ));
                }
            }
            ReportPayload::WebFindings(findings) => {
                out.push_str("## Findings\n\n");
                if findings.is_empty() {
                    out.push_str("No results found.\n");
                }
                for (i, finding) in findings.iter().enumerate() {
                    out.push_str(&format!(
                        "{}. [{}]({})\n   {}\n",
                        i + 1,
                        finding.title,
                        finding.url,
                        finding.snippet
                    ));
                }
            }
            ReportPayload::Translation(outcome) => match outcome {
                TranslationOutcome::Succeeded {
                    output,
                    byte_size,
                    warnings,
                } => {
                    out.push_str("## Translation\n\n");
                    out.push_str(&format!("- Output: {}\n- Size: {} bytes\n", output, byte_size));
                    if !warnings.is_empty() {
                        out.push_str("\n### Warnings\n\n");
                        for warning in warnings {
                            out.push_str(&format!("- {}\n", warning));
                        }
                    }
                }
                TranslationOutcome::Failed { stage, reason } => {
                    out.push_str("## Translation\n\n");
                    out.push_str(&format!("Failed at the {} stage: {}\n", stage, reason));
                }
            },
            ReportPayload::Failure { message } => {
                out.push_str("## Error\n\n");
                out.push_str(&format!("{}\n", message));
            }
        }

        out
    }
}
