// Research workflow - general questions answered from the public web

use super::{Workflow, WorkflowError};
use crate::routing::types::{Query, ReportPayload, WorkflowLabel};
use crate::search::WebSearchClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct ResearchWorkflow {
    web: Arc<WebSearchClient>,
}

impl ResearchWorkflow {
    pub fn new(web: Arc<WebSearchClient>) -> Self {
        Self { web }
    }
}

#[async_trait]
impl Workflow for ResearchWorkflow {
    fn label(&self) -> WorkflowLabel {
        WorkflowLabel::Research
    }

    async fn run(&self, query: &Query) -> Result<ReportPayload, WorkflowError> {
        info!("running web research");
        let findings = self.web.search(&query.text).await?;
        Ok(ReportPayload::WebFindings(findings))
    }
}
