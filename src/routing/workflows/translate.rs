// Translate workflow - parses the translation request, locates the
// source document and drives the translation pipeline

use super::{Workflow, WorkflowError};
use crate::routing::types::{Query, ReportPayload, WorkflowLabel};
use crate::translation::{
    DocumentReference, LanguageResolver, LanguageSpec, Stage, StorageLocator, TranslationJob,
    TranslationOrchestrator, TranslationOutcome,
};
use async_trait::async_trait;
use regex::Regex;
use tracing::info;

/// The request forms the workflow understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub reference: String,
    pub source: Option<String>,
    pub target: String,
}

/// Compiled patterns for the supported request phrasings. The
/// "from X to Y" form must be tried before the plain "to Y" form, or
/// the source language would be swallowed into the reference.
pub struct RequestGrammar {
    from_to: Regex,
    to: Regex,
    bare: Regex,
}

impl Default for RequestGrammar {
    fn default() -> Self {
        Self {
            from_to: Regex::new(
                r"(?i)\b(?:translate|convert)\s+(?:the\s+)?(?:file\s+|document\s+)?(\S+)\s+from\s+(\S+)\s+(?:to|into)\s+(\S+)",
            )
            .expect("valid regex"),
            to: Regex::new(
                r"(?i)\b(?:translate|convert)\s+(?:the\s+)?(?:file\s+|document\s+)?(\S+)\s+(?:to|into)\s+(\S+)",
            )
            .expect("valid regex"),
            bare: Regex::new(r"(?i)^\s*(\S+)\s+(?:to|into)\s+(\S+)\s*$").expect("valid regex"),
        }
    }
}

impl RequestGrammar {
    /// Extract reference and languages from the query text
    pub fn parse(&self, text: &str) -> Option<TranslateRequest> {
        if let Some(caps) = self.from_to.captures(text) {
            return Some(TranslateRequest {
                reference: clean(&caps[1]),
                source: Some(clean(&caps[2])),
                target: clean(&caps[3]),
            });
        }
        if let Some(caps) = self.to.captures(text) {
            return Some(TranslateRequest {
                reference: clean(&caps[1]),
                source: None,
                target: clean(&caps[2]),
            });
        }
        if let Some(caps) = self.bare.captures(text) {
            return Some(TranslateRequest {
                reference: clean(&caps[1]),
                source: None,
                target: clean(&caps[2]),
            });
        }
        None
    }
}

/// Trailing punctuation from natural phrasing is not part of the token
fn clean(token: &str) -> String {
    token
        .trim_end_matches(['.', ',', '!', '?', ';', ':', '"', '\''])
        .to_string()
}

pub struct TranslateWorkflow {
    grammar: RequestGrammar,
    locator: StorageLocator,
    orchestrator: TranslationOrchestrator,
}

impl TranslateWorkflow {
    pub fn new(locator: StorageLocator, orchestrator: TranslationOrchestrator) -> Self {
        Self {
            grammar: RequestGrammar::default(),
            locator,
            orchestrator,
        }
    }
}

#[async_trait]
impl Workflow for TranslateWorkflow {
    fn label(&self) -> WorkflowLabel {
        WorkflowLabel::Translate
    }

    /// Failures before submit are reported as a `locate`-stage outcome
    /// rather than raised, so the caller always gets a complete report.
    async fn run(&self, query: &Query) -> Result<ReportPayload, WorkflowError> {
        let request = self.grammar.parse(&query.text).ok_or_else(|| {
            WorkflowError::Parse(
                "expected a phrasing like 'translate <file> to <language>'".to_string(),
            )
        })?;

        let target = match LanguageResolver::normalize(&request.target) {
            Ok(target) => target,
            Err(e) => return Ok(failed_locate(e.to_string())),
        };
        if target.is_auto() {
            return Ok(failed_locate("target language cannot be 'auto'".to_string()));
        }

        let source_token = request
            .source
            .clone()
            .or_else(|| query.hints.language.clone());
        let source_language = match source_token {
            Some(token) => match LanguageResolver::normalize(&token) {
                Ok(language) => language,
                Err(e) => return Ok(failed_locate(e.to_string())),
            },
            None => LanguageSpec::auto(),
        };

        // Container grammar only applies when a blob store exists; with
        // no store a container-looking path is a local relative path
        let reference = DocumentReference::parse(&request.reference, self.locator.blob_containers());
        let resolved = match self.locator.resolve(&reference, query.hints.backend).await {
            Ok(resolved) => resolved,
            Err(e) => return Ok(failed_locate(e.to_string())),
        };
        info!(source = %resolved.place, target = %target, "document located, translating");

        let job = TranslationJob::new(resolved, target).with_source_language(source_language);
        let outcome = self.orchestrator.translate(&job).await;
        Ok(ReportPayload::Translation(outcome))
    }
}

fn failed_locate(reason: String) -> ReportPayload {
    ReportPayload::Translation(TranslationOutcome::Failed {
        stage: Stage::Locate,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<TranslateRequest> {
        RequestGrammar::default().parse(text)
    }

    #[test]
    fn test_parse_translate_to() {
        let request = parse("translate report.pdf to spanish").unwrap();
        assert_eq!(request.reference, "report.pdf");
        assert_eq!(request.source, None);
        assert_eq!(request.target, "spanish");
    }

    #[test]
    fn test_parse_from_to_captures_source() {
        let request = parse("translate contract.docx from english to french").unwrap();
        assert_eq!(request.reference, "contract.docx");
        assert_eq!(request.source.as_deref(), Some("english"));
        assert_eq!(request.target, "french");
    }

    #[test]
    fn test_parse_filler_words_and_into() {
        let request = parse("please translate the file report.pdf into german.").unwrap();
        assert_eq!(request.reference, "report.pdf");
        assert_eq!(request.target, "german");

        let request = parse("convert the document q3/summary.doc to dutch").unwrap();
        assert_eq!(request.reference, "q3/summary.doc");
    }

    #[test]
    fn test_parse_bare_form() {
        let request = parse("report.pdf to spanish").unwrap();
        assert_eq!(request.reference, "report.pdf");
        assert_eq!(request.target, "spanish");
    }

    #[test]
    fn test_parse_keeps_blob_and_local_paths_intact() {
        let request = parse("translate documents/contract.pdf to french").unwrap();
        assert_eq!(request.reference, "documents/contract.pdf");

        let request = parse("translate /tmp/x/report.pdf to es").unwrap();
        assert_eq!(request.reference, "/tmp/x/report.pdf");
    }

    #[test]
    fn test_parse_rejects_non_translation_text() {
        assert!(parse("what are GT's expense approval policies").is_none());
        assert!(parse("tell me about spanish history").is_none());
    }
}
