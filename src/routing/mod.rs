// Routing - query classification and workflow dispatch

pub mod classifier;
pub mod router;
pub mod types;
pub mod workflows;

pub use classifier::{KeywordRules, ModelError, OllamaRouteModel, QueryClassifier, RouteModel};
pub use router::Router;
pub use types::{Query, QueryHints, ReportPayload, WorkflowLabel, WorkflowReport};
pub use workflows::{
    GuidanceWorkflow, MethodologyWorkflow, ResearchWorkflow, TranslateWorkflow, Workflow,
    WorkflowError, WorkflowRegistry,
};
