// Methodology workflow - answers audit-methodology questions from the
// internal document index

use super::{Workflow, WorkflowError};
use crate::routing::types::{Query, ReportPayload, WorkflowLabel};
use crate::search::SearchIndexClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct MethodologyWorkflow {
    search: Arc<SearchIndexClient>,
    index: String,
}

impl MethodologyWorkflow {
    pub fn new(search: Arc<SearchIndexClient>, index: impl Into<String>) -> Self {
        Self {
            search,
            index: index.into(),
        }
    }
}

#[async_trait]
impl Workflow for MethodologyWorkflow {
    fn label(&self) -> WorkflowLabel {
        WorkflowLabel::Methodology
    }

    async fn run(&self, query: &Query) -> Result<ReportPayload, WorkflowError> {
        info!(index = %self.index, "running methodology search");
        let hits = self.search.search(&self.index, &query.text).await?;
        Ok(ReportPayload::SearchHits(hits))
    }
}
