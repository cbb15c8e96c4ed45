// Configuration for the routing and translation pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration, typically loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub web: WebSearchConfig,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("ROUTER_MODEL") {
            config.router.model = model;
        }
        if let Ok(endpoint) = std::env::var("ROUTER_ENDPOINT") {
            config.router.endpoint = endpoint;
        }
        if let Ok(endpoint) = std::env::var("SEARCH_ENDPOINT") {
            config.search.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("SEARCH_API_KEY") {
            config.search.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("SERPER_API_KEY") {
            config.web.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("TRANSLATOR_ENDPOINT") {
            config.translator.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("TRANSLATOR_API_KEY") {
            config.translator.api_key = Some(key);
        }
        if let Ok(dir) = std::env::var("DOCUMENTS_DIR") {
            config.storage.documents_dir = Some(PathBuf::from(dir));
        }
        if let Ok(account) = std::env::var("BLOB_ACCOUNT") {
            config.storage.blob_account = Some(account);
        }
        if let Ok(token) = std::env::var("BLOB_SAS_TOKEN") {
            config.storage.blob_sas_token = Some(token);
        }
        if let Ok(containers) = std::env::var("BLOB_CONTAINERS") {
            config.storage.containers = containers
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }

        config
    }
}

/// Configuration for the classification model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_router_endpoint")]
    pub endpoint: String,

    /// Ceiling for a single classification call, in seconds
    #[serde(default = "default_router_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-oss:20b".to_string()
}

fn default_router_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_router_timeout() -> u64 {
    30
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_router_endpoint(),
            timeout_secs: default_router_timeout(),
        }
    }
}

/// Configuration for the semantic search service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,

    /// Index holding audit methodology documents
    #[serde(default = "default_methodology_index")]
    pub methodology_index: String,

    /// Index holding GT guidelines and policy documents
    #[serde(default = "default_guidance_index")]
    pub guidance_index: String,

    #[serde(default = "default_search_top")]
    pub top: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_methodology_index() -> String {
    "audit-iq".to_string()
}

fn default_guidance_index() -> String {
    "echo".to_string()
}

fn default_search_top() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            methodology_index: default_methodology_index(),
            guidance_index: default_guidance_index(),
            top: default_search_top(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Configuration for the web search service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_web_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_search_top")]
    pub results: usize,

    #[serde(default = "default_web_timeout")]
    pub timeout_secs: u64,
}

fn default_web_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}

fn default_web_timeout() -> u64 {
    15
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_web_endpoint(),
            results: default_search_top(),
            timeout_secs: default_web_timeout(),
        }
    }
}

/// Configuration for the document translation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,

    /// Delay between status polls, in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Overall ceiling for one translation operation, in seconds.
    /// The remote operation may still complete after we stop waiting.
    #[serde(default = "default_translate_timeout")]
    pub timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    2
}

fn default_translate_timeout() -> u64 {
    120
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_translate_timeout(),
        }
    }
}

/// Configuration for document storage backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Highest-priority local documents directory
    pub documents_dir: Option<PathBuf>,

    pub blob_account: Option<String>,
    pub blob_sas_token: Option<String>,

    /// Containers searched for bare filenames, and recognized as the
    /// first segment of container/key references
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,
}

fn default_containers() -> Vec<String> {
    vec!["documents".to_string(), "translated".to_string()]
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_dir: None,
            blob_account: None,
            blob_sas_token: None,
            containers: default_containers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.search.methodology_index, "audit-iq");
        assert_eq!(config.search.guidance_index, "echo");
        assert_eq!(config.search.top, 5);
        assert_eq!(config.web.timeout_secs, 15);
        assert_eq!(config.translator.poll_interval_secs, 2);
        assert_eq!(
            config.storage.containers,
            vec!["documents".to_string(), "translated".to_string()]
        );
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.router.model, config.router.model);
        assert_eq!(parsed.translator.timeout_secs, config.translator.timeout_secs);
    }
}
