// Translation - document location, language normalization and the
// asynchronous translation pipeline

pub mod azure;
pub mod blob;
pub mod language;
pub mod locator;
pub mod orchestrator;
pub mod reference;

pub use azure::AzureDocumentTranslator;
pub use blob::{AzureBlobStore, ObjectStore, StorageError};
pub use language::{LanguageError, LanguageResolver, LanguageSpec};
pub use locator::{LocateError, StorageLocator};
pub use orchestrator::{
    BackendError, HandleKind, OperationHandle, OperationState, OperationStatus, Stage,
    TranslationBackend, TranslationJob, TranslationOrchestrator, TranslationOutcome,
};
pub use reference::{
    Backend, DocumentReference, Place, RefKind, ResolvedLocation, SUPPORTED_EXTENSIONS,
};
