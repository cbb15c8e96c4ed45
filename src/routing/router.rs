// Router - classifies a query and dispatches it to the matching workflow

use super::classifier::QueryClassifier;
use super::types::{Query, ReportPayload, WorkflowLabel, WorkflowReport};
use super::workflows::WorkflowRegistry;
use tracing::info;

/// Front door of the pipeline. Every query yields exactly one report;
/// workflow errors are folded into the report rather than raised.
pub struct Router {
    classifier: QueryClassifier,
    registry: WorkflowRegistry,
}

impl Router {
    pub fn new(classifier: QueryClassifier, registry: WorkflowRegistry) -> Self {
        Self {
            classifier,
            registry,
        }
    }

    /// Classify and handle one query
    pub async fn handle(&self, query: &Query) -> WorkflowReport {
        let label = self.classifier.classify(query).await;
        self.dispatch(query, label).await
    }

    /// Handle one query under a caller-forced label, skipping
    /// classification
    pub async fn handle_as(&self, query: &Query, label: WorkflowLabel) -> WorkflowReport {
        self.dispatch(query, label).await
    }

    async fn dispatch(&self, query: &Query, label: WorkflowLabel) -> WorkflowReport {
        info!(%label, "dispatching query");

        let payload = match self.registry.get(label) {
            Some(workflow) => workflow
                .run(query)
                .await
                .unwrap_or_else(|e| ReportPayload::Failure {
                    message: e.to_string(),
                }),
            None => ReportPayload::Failure {
                message: format!("no workflow registered for {}", label),
            },
        };

        WorkflowReport::new(label, &query.text, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::classifier::{ModelError, RouteModel};
    use crate::routing::workflows::{Workflow, WorkflowError};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedModel(&'static str);

    #[async_trait]
    impl RouteModel for FixedModel {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingWorkflow;

    #[async_trait]
    impl Workflow for FailingWorkflow {
        fn label(&self) -> WorkflowLabel {
            WorkflowLabel::Research
        }

        async fn run(&self, _query: &Query) -> Result<ReportPayload, WorkflowError> {
            Err(WorkflowError::Parse("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unregistered_workflow_yields_failure_report() {
        let classifier = QueryClassifier::new(Arc::new(FixedModel("RESEARCH")));
        let router = Router::new(classifier, WorkflowRegistry::new());

        let report = router.handle(&Query::new("anything")).await;
        assert_eq!(report.label, WorkflowLabel::Research);
        assert!(matches!(report.payload, ReportPayload::Failure { .. }));
    }

    #[tokio::test]
    async fn test_workflow_error_is_folded_into_report() {
        let classifier = QueryClassifier::new(Arc::new(FixedModel("RESEARCH")));
        let mut registry = WorkflowRegistry::new();
        registry.register(Arc::new(FailingWorkflow));
        let router = Router::new(classifier, registry);

        let report = router.handle(&Query::new("anything")).await;
        match report.payload {
            ReportPayload::Failure { message } => assert!(message.contains("boom")),
            other => panic!("expected failure payload, got {:?}", other),
        }
    }
}
