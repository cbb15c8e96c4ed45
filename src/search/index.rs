// Semantic index client - full-text queries against Azure Cognitive
// Search indexes

use super::SearchError;
use crate::config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "2023-11-01";
const EXCERPT_CHARS: usize = 500;

/// One scored result from a semantic index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub score: f64,
    pub excerpt: String,
}

/// Client for the document indexes. One instance serves every index on
/// the service; the index name is chosen per call.
pub struct SearchIndexClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    top: usize,
}

impl SearchIndexClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let endpoint = config
            .endpoint
            .as_ref()
            .ok_or_else(|| SearchError::NotConfigured("SEARCH_ENDPOINT is not set".into()))?;
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| SearchError::NotConfigured("SEARCH_API_KEY is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
            top: config.top,
        })
    }

    /// Run a query against the named index, best matches first
    pub async fn search(&self, index: &str, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, index, API_VERSION
        );

        let response = self
            .client
            .post(url)
            .header("api-key", &self.api_key)
            .json(&IndexQuery {
                search: query.to_string(),
                top: self.top,
            })
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Service { status, body });
        }

        let parsed: IndexResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Request(format!("malformed search response: {}", e)))?;

        debug!(index, hits = parsed.value.len(), "index search complete");
        Ok(parsed.value.into_iter().map(SearchHit::from).collect())
    }
}

#[derive(Debug, Serialize)]
struct IndexQuery {
    search: String,
    top: usize,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    value: Vec<IndexDocument>,
}

#[derive(Debug, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    content: Option<String>,

    #[serde(rename = "@search.score", default)]
    score: f64,
}

impl From<IndexDocument> for SearchHit {
    fn from(doc: IndexDocument) -> Self {
        SearchHit {
            title: doc.title.unwrap_or_else(|| "untitled".to_string()),
            score: doc.score,
            excerpt: excerpt(doc.content.as_deref().unwrap_or_default()),
        }
    }
}

/// First `EXCERPT_CHARS` characters of the document body, on a char
/// boundary, with an ellipsis when truncated
fn excerpt(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}
