// Query classifier - constrained LLM call with a deterministic keyword
// fallback, so every query routes somewhere

use super::types::{Query, WorkflowLabel};
use crate::config::RouterConfig;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Seam over the classification model call
#[async_trait]
pub trait RouteModel: Send + Sync {
    /// One completion; the response is expected to be a bare label
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;
}

/// Classification model served by a local Ollama instance
pub struct OllamaRouteModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaRouteModel {
    pub fn new(config: &RouterConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl RouteModel for OllamaRouteModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError(format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ModelError(format!(
                "model request returned {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError(format!("malformed model response: {}", e)))?;

        Ok(chat.message.content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
}

/// Vocabulary driving the keyword fallback. The lists are tunable
/// configuration, not a contract; these defaults cover the common
/// phrasings seen in practice.
#[derive(Debug, Clone)]
pub struct KeywordRules {
    pub translate_markers: Vec<String>,
    pub guidance_terms: Vec<String>,
    pub methodology_terms: Vec<String>,
    file_token: Regex,
}

impl Default for KeywordRules {
    fn default() -> Self {
        let owned = |terms: &[&str]| terms.iter().map(|t| t.to_string()).collect();
        Self {
            translate_markers: owned(&["translate", "translation", "convert"]),
            guidance_terms: owned(&[
                "policy",
                "policies",
                "guideline",
                "guidelines",
                "gt",
                "compliance",
                "regulation",
                "regulations",
                "requirement",
                "requirements",
                "governance",
                "approval",
            ]),
            methodology_terms: owned(&[
                "methodology",
                "procedure",
                "procedures",
                "how to",
                "how do",
                "steps",
                "approach",
                "technique",
                "techniques",
                "framework",
                "process",
                "sampling",
            ]),
            // A filename-looking token: something with a short extension
            file_token: Regex::new(r"\S+\.[A-Za-z0-9]{2,5}\b").expect("valid regex"),
        }
    }
}

/// Maps a query to a workflow label. The model is an untrusted oracle:
/// its answer is validated against the fixed label set and anything
/// else falls back to the keyword heuristic, which is total.
pub struct QueryClassifier {
    model: std::sync::Arc<dyn RouteModel>,
    rules: KeywordRules,
}

impl QueryClassifier {
    pub fn new(model: std::sync::Arc<dyn RouteModel>) -> Self {
        Self {
            model,
            rules: KeywordRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: KeywordRules) -> Self {
        self.rules = rules;
        self
    }

    /// Classify a query. Total: always returns one of the four routable
    /// labels, never `Unknown`.
    pub async fn classify(&self, query: &Query) -> WorkflowLabel {
        let system = build_system_prompt();

        match self.model.complete(&system, &query.text).await {
            Ok(raw) => {
                if let Some(label) = validate_label(&raw) {
                    debug!(%label, "model classified query");
                    return label;
                }
                warn!(response = %raw.trim(), "unusable model response, using keyword fallback");
            }
            Err(e) => {
                warn!(error = %e, "classification model unavailable, using keyword fallback");
            }
        }

        self.fallback(&query.text)
    }

    /// Deterministic keyword heuristic. Precedence: a translation marker
    /// next to a filename-looking token wins; then guidance vocabulary
    /// (ties with methodology go to guidance, since policy questions
    /// often mention procedures); then methodology; RESEARCH is the
    /// catch-all.
    pub fn fallback(&self, text: &str) -> WorkflowLabel {
        let lower = text.to_lowercase();

        let wants_translation = self
            .rules
            .translate_markers
            .iter()
            .any(|marker| lower.contains(marker.as_str()));
        if wants_translation && self.rules.file_token.is_match(&lower) {
            return WorkflowLabel::Translate;
        }

        let guidance = score(&lower, &self.rules.guidance_terms);
        let methodology = score(&lower, &self.rules.methodology_terms);

        let label = if guidance > 0 && guidance >= methodology {
            WorkflowLabel::Guidance
        } else if methodology > 0 {
            WorkflowLabel::Methodology
        } else {
            WorkflowLabel::Research
        };
        debug!(%label, guidance, methodology, "keyword fallback classified query");
        label
    }
}

/// Phrases match as substrings; single-word terms must match a whole
/// word, so short tokens like "gt" do not fire inside longer words.
fn score(text: &str, terms: &[String]) -> usize {
    let words: std::collections::HashSet<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    terms
        .iter()
        .filter(|term| {
            if term.contains(' ') {
                text.contains(term.as_str())
            } else {
                words.contains(term.as_str())
            }
        })
        .count()
}

fn build_system_prompt() -> String {
    let mut prompt = String::from(
        "You are a query router. Classify the user's query into exactly one of these workflows:\n\n",
    );
    for label in WorkflowLabel::routable() {
        prompt.push_str(&format!("- {}: {}\n", label.as_str(), label.description()));
    }
    prompt.push_str(
        "\nRespond with ONLY the workflow name in capitals, nothing else. \
         Example response: RESEARCH",
    );
    prompt
}

/// Accept only an exact label, modulo surrounding whitespace and case
fn validate_label(raw: &str) -> Option<WorkflowLabel> {
    let cleaned = raw.trim().to_uppercase();
    WorkflowLabel::routable()
        .into_iter()
        .find(|label| cleaned == label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedModel {
        response: Result<String, String>,
    }

    #[async_trait]
    impl RouteModel for CannedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ModelError> {
            self.response
                .clone()
                .map_err(ModelError)
        }
    }

    fn classifier_with(response: Result<&str, &str>) -> QueryClassifier {
        QueryClassifier::new(std::sync::Arc::new(CannedModel {
            response: response.map(str::to_string).map_err(str::to_string),
        }))
    }

    #[tokio::test]
    async fn test_valid_model_label_is_used() {
        let classifier = classifier_with(Ok("  translate \n"));
        let label = classifier.classify(&Query::new("whatever")).await;
        assert_eq!(label, WorkflowLabel::Translate);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let classifier = classifier_with(Ok("I think this is a TRANSLATE request because..."));
        let label = classifier
            .classify(&Query::new("what are GT's expense approval policies"))
            .await;
        assert_eq!(label, WorkflowLabel::Guidance);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_guidance_vocabulary() {
        let classifier = classifier_with(Err("connection refused"));
        let label = classifier
            .classify(&Query::new("what are GT's expense approval policies"))
            .await;
        assert_eq!(label, WorkflowLabel::Guidance);
    }

    #[tokio::test]
    async fn test_fallback_is_total() {
        let classifier = classifier_with(Err("down"));
        for text in ["", "hello", "what is the weather in oslo", "??"] {
            let label = classifier.classify(&Query::new(text)).await;
            assert_ne!(label, WorkflowLabel::Unknown);
        }
    }

    #[test]
    fn test_fallback_translate_needs_a_file_token() {
        let classifier = classifier_with(Err("down"));
        assert_eq!(
            classifier.fallback("translate report.pdf to spanish"),
            WorkflowLabel::Translate
        );
        // Marker without a filename is not a document translation
        assert_eq!(
            classifier.fallback("how do i translate revenue figures"),
            WorkflowLabel::Methodology
        );
    }

    #[test]
    fn test_fallback_precedence() {
        let classifier = classifier_with(Err("down"));
        assert_eq!(
            classifier.fallback("what is our sampling methodology"),
            WorkflowLabel::Methodology
        );
        // Guidance wins ties against methodology
        assert_eq!(
            classifier.fallback("what does the policy say about this procedure"),
            WorkflowLabel::Guidance
        );
        assert_eq!(
            classifier.fallback("latest IFRS 17 developments"),
            WorkflowLabel::Research
        );
    }

    #[test]
    fn test_short_terms_match_whole_words_only() {
        let classifier = classifier_with(Err("down"));
        // "strength" contains "gt" but is not a guidance hit
        assert_eq!(
            classifier.fallback("what is the tensile strength of steel"),
            WorkflowLabel::Research
        );
        assert_eq!(
            classifier.fallback("does gt allow this"),
            WorkflowLabel::Guidance
        );
        assert_eq!(
            classifier.fallback("what are gt's reporting requirements"),
            WorkflowLabel::Guidance
        );
    }

    #[test]
    fn test_validate_label_rejects_noise() {
        assert_eq!(validate_label("RESEARCH"), Some(WorkflowLabel::Research));
        assert_eq!(validate_label("guidance"), Some(WorkflowLabel::Guidance));
        assert_eq!(validate_label(""), None);
        assert_eq!(validate_label("RESEARCH because it is general"), None);
        assert_eq!(validate_label("UNKNOWN"), None);
    }
}
