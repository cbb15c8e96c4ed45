// Search - semantic index queries and general web search

pub mod index;
pub mod web;

pub use index::{SearchHit, SearchIndexClient};
pub use web::{WebFinding, WebSearchClient};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search is not configured: {0}")]
    NotConfigured(String),

    #[error("search request failed: {0}")]
    Request(String),

    #[error("search service returned {status}: {body}")]
    Service { status: u16, body: String },
}
