// Web search client for the research workflow

use super::SearchError;
use crate::config::WebSearchConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One organic web result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebFinding {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Serper.dev client
pub struct WebSearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    results: usize,
}

impl WebSearchClient {
    pub fn new(config: &WebSearchConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| SearchError::NotConfigured("SERPER_API_KEY is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.clone(),
            results: config.results,
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<WebFinding>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&WebQuery {
                q: query.to_string(),
                num: self.results,
            })
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Service { status, body });
        }

        let parsed: WebResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Request(format!("malformed web search response: {}", e)))?;

        debug!(findings = parsed.organic.len(), "web search complete");
        Ok(parsed
            .organic
            .into_iter()
            .take(self.results)
            .map(|result| WebFinding {
                title: result.title,
                url: result.link,
                snippet: result.snippet.unwrap_or_default(),
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct WebQuery {
    q: String,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct WebResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,

    #[serde(default)]
    snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "organic": [
                {"title": "IFRS 17 overview", "link": "https://example.org/ifrs17", "snippet": "An overview."},
                {"title": "No snippet", "link": "https://example.org/none"}
            ]
        }"#;
        let parsed: WebResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].title, "IFRS 17 overview");
        assert!(parsed.organic[1].snippet.is_none());
    }

    #[test]
    fn test_empty_response_yields_no_findings() {
        let parsed: WebResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.organic.is_empty());
    }

    #[test]
    fn test_unconfigured_client_fails_fast() {
        let config = WebSearchConfig::default();
        assert!(matches!(
            WebSearchClient::new(&config),
            Err(SearchError::NotConfigured(_))
        ));
    }
}
