// Workflows - the four handling paths a classified query can take

pub mod guidance;
pub mod methodology;
pub mod research;
pub mod translate;

pub use guidance::GuidanceWorkflow;
pub use methodology::MethodologyWorkflow;
pub use research::ResearchWorkflow;
pub use translate::TranslateWorkflow;

use super::types::{Query, ReportPayload, WorkflowLabel};
use crate::search::SearchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("could not understand the request: {0}")]
    Parse(String),
}

/// A handling path for one kind of query
#[async_trait]
pub trait Workflow: Send + Sync {
    fn label(&self) -> WorkflowLabel;

    fn description(&self) -> &'static str {
        self.label().description()
    }

    async fn run(&self, query: &Query) -> Result<ReportPayload, WorkflowError>;
}

/// Registry of available workflows, keyed by label
pub struct WorkflowRegistry {
    workflows: HashMap<WorkflowLabel, Arc<dyn Workflow>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            workflows: HashMap::new(),
        }
    }

    pub fn register(&mut self, workflow: Arc<dyn Workflow>) {
        self.workflows.insert(workflow.label(), workflow);
    }

    pub fn get(&self, label: WorkflowLabel) -> Option<Arc<dyn Workflow>> {
        self.workflows.get(&label).cloned()
    }

    pub fn labels(&self) -> Vec<WorkflowLabel> {
        self.workflows.keys().copied().collect()
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
