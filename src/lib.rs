// Auditflow - routes audit queries to specialized workflows and drives
// document translation across local and blob storage

pub mod config;
pub mod routing;
pub mod search;
pub mod translation;

pub use config::AppConfig;
pub use routing::router::Router;
pub use routing::types::{Query, ReportPayload, WorkflowLabel, WorkflowReport};
pub use translation::language::LanguageResolver;
pub use translation::locator::StorageLocator;
pub use translation::orchestrator::{TranslationOrchestrator, TranslationOutcome};
