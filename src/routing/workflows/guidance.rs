// Guidance workflow - answers guideline and policy questions from the
// internal guidance index

use super::{Workflow, WorkflowError};
use crate::routing::types::{Query, ReportPayload, WorkflowLabel};
use crate::search::SearchIndexClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct GuidanceWorkflow {
    search: Arc<SearchIndexClient>,
    index: String,
}

impl GuidanceWorkflow {
    pub fn new(search: Arc<SearchIndexClient>, index: impl Into<String>) -> Self {
        Self {
            search,
            index: index.into(),
        }
    }
}

#[async_trait]
impl Workflow for GuidanceWorkflow {
    fn label(&self) -> WorkflowLabel {
        WorkflowLabel::Guidance
    }

    async fn run(&self, query: &Query) -> Result<ReportPayload, WorkflowError> {
        info!(index = %self.index, "running guidance search");
        let hits = self.search.search(&self.index, &query.text).await?;
        Ok(ReportPayload::SearchHits(hits))
    }
}
