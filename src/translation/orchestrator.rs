// Translation orchestrator - drives the submit/poll/fetch protocol
// against an asynchronous translation backend

use super::blob::ObjectStore;
use super::language::LanguageSpec;
use super::reference::{Place, ResolvedLocation};
use crate::config::TranslatorConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// One translation request: a resolved source, a concrete output
/// coordinate and the language pair.
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub source: ResolvedLocation,
    pub target: LanguageSpec,
    pub source_language: LanguageSpec,
    pub output: Place,
}

impl TranslationJob {
    /// Job with auto-detected source language and the default output
    /// location (same backend, stem suffixed with the target code).
    pub fn new(source: ResolvedLocation, target: LanguageSpec) -> Self {
        let output = source.place.derive_output(&target.code);
        Self {
            source,
            target,
            source_language: LanguageSpec::auto(),
            output,
        }
    }

    pub fn with_source_language(mut self, language: LanguageSpec) -> Self {
        self.source_language = language;
        self
    }

    pub fn with_output(mut self, output: Place) -> Self {
        self.output = output;
        self
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Locate,
    Submit,
    Poll,
    Fetch,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Locate => "locate",
            Stage::Submit => "submit",
            Stage::Poll => "poll",
            Stage::Fetch => "fetch",
            Stage::Write => "write",
        };
        write!(f, "{}", name)
    }
}

/// Terminal result of one translation invocation. Failures are values,
/// not errors: the caller always gets a complete outcome to report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TranslationOutcome {
    Succeeded {
        output: Place,
        byte_size: u64,
        warnings: Vec<String>,
    },
    Failed {
        stage: Stage,
        reason: String,
    },
}

impl TranslationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Succeeded { .. })
    }

    fn failed(stage: Stage, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(?stage, %reason, "translation failed");
        TranslationOutcome::Failed { stage, reason }
    }
}

/// Handle to a submitted operation. Backends that complete synchronously
/// return an already-terminal handle carrying the translated bytes.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    pub id: String,
    pub kind: HandleKind,
}

#[derive(Debug, Clone)]
pub enum HandleKind {
    /// Remote long-running operation, identified by its status URL
    Remote { status_url: String },
    /// Operation that finished during submit; bytes are held inline
    Inline { bytes: Arc<Vec<u8>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::NotStarted | OperationState::Running)
    }
}

/// Status snapshot of a submitted operation
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub state: OperationState,
    pub detail: Option<String>,
    pub warnings: Vec<String>,
}

impl OperationStatus {
    pub fn running() -> Self {
        Self {
            state: OperationState::Running,
            detail: None,
            warnings: Vec::new(),
        }
    }

    pub fn succeeded() -> Self {
        Self {
            state: OperationState::Succeeded,
            detail: None,
            warnings: Vec::new(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            state: OperationState::Failed,
            detail: Some(detail.into()),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Seam over the remote translation service
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Issue the translation request; returns an operation handle
    async fn submit(&self, job: &TranslationJob) -> Result<OperationHandle, BackendError>;

    /// Query the current status of an operation
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, BackendError>;

    /// Translated bytes, when the backend holds the artifact itself
    /// rather than having written it to the output location
    async fn fetch(&self, handle: &OperationHandle) -> Result<Option<Vec<u8>>, BackendError>;
}

/// Drives one translation job through submit, bounded polling, fetch and
/// write. Holds only configuration; safe to share across invocations.
pub struct TranslationOrchestrator {
    backend: Arc<dyn TranslationBackend>,
    store: Option<Arc<dyn ObjectStore>>,
    poll_interval: Duration,
    timeout: Duration,
}

impl TranslationOrchestrator {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        store: Option<Arc<dyn ObjectStore>>,
        config: &TranslatorConfig,
    ) -> Self {
        Self {
            backend,
            store,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run the job to a terminal outcome. Never returns an error and
    /// never retries: a failed stage is reported as-is, since retrying a
    /// billable translation risks duplicate work.
    pub async fn translate(&self, job: &TranslationJob) -> TranslationOutcome {
        if let Some(reason) = validate(job) {
            return TranslationOutcome::failed(Stage::Submit, reason);
        }

        let handle = match self.backend.submit(job).await {
            Ok(handle) => handle,
            Err(e) => return TranslationOutcome::failed(Stage::Submit, e.to_string()),
        };
        debug!(operation = %handle.id, "translation submitted");

        let warnings = match self.await_terminal(&handle).await {
            Ok(warnings) => warnings,
            Err(outcome) => return outcome,
        };

        self.deliver(job, &handle, warnings).await
    }

    /// Poll until the operation reaches a terminal state or the deadline
    /// passes. Waiting suspends cooperatively; abandoning the wait does
    /// not cancel the remote operation.
    async fn await_terminal(
        &self,
        handle: &OperationHandle,
    ) -> Result<Vec<String>, TranslationOutcome> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let status = self
                .backend
                .poll(handle)
                .await
                .map_err(|e| TranslationOutcome::failed(Stage::Poll, e.to_string()))?;

            match status.state {
                OperationState::Succeeded => return Ok(status.warnings),
                OperationState::Failed => {
                    let detail = status
                        .detail
                        .unwrap_or_else(|| "no failure detail reported".to_string());
                    return Err(TranslationOutcome::failed(
                        Stage::Poll,
                        format!("translation service reported failure: {}", detail),
                    ));
                }
                OperationState::Canceled => {
                    return Err(TranslationOutcome::failed(
                        Stage::Poll,
                        "operation was canceled on the service side",
                    ));
                }
                OperationState::NotStarted | OperationState::Running => {
                    if Instant::now() + self.poll_interval > deadline {
                        return Err(TranslationOutcome::failed(
                            Stage::Poll,
                            format!(
                                "operation did not complete before the {}s timeout; it may still complete on the service side",
                                self.timeout.as_secs()
                            ),
                        ));
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Fetch stage, plus the write stage when the backend hands the
    /// artifact back instead of delivering it to the output location.
    async fn deliver(
        &self,
        job: &TranslationJob,
        handle: &OperationHandle,
        warnings: Vec<String>,
    ) -> TranslationOutcome {
        let bytes = match self.backend.fetch(handle).await {
            Ok(bytes) => bytes,
            Err(e) => return TranslationOutcome::failed(Stage::Fetch, e.to_string()),
        };

        match bytes {
            Some(bytes) => {
                let byte_size = bytes.len() as u64;
                if let Err(reason) = self.write_output(job, bytes).await {
                    return TranslationOutcome::failed(Stage::Write, reason);
                }
                TranslationOutcome::Succeeded {
                    output: job.output.clone(),
                    byte_size,
                    warnings,
                }
            }
            None => match self.confirm_output(&job.output).await {
                Ok(byte_size) => TranslationOutcome::Succeeded {
                    output: job.output.clone(),
                    byte_size,
                    warnings,
                },
                Err(reason) => TranslationOutcome::failed(Stage::Fetch, reason),
            },
        }
    }

    async fn write_output(&self, job: &TranslationJob, bytes: Vec<u8>) -> Result<(), String> {
        match &job.output {
            Place::Local(path) => tokio::fs::write(path, bytes)
                .await
                .map_err(|e| format!("could not write {}: {}", path.display(), e)),
            Place::Blob { container, key } => match &self.store {
                Some(store) => store
                    .put(container, key, bytes, &job.source.content_type)
                    .await
                    .map_err(|e| e.to_string()),
                None => Err("blob output requested but blob storage is not configured".to_string()),
            },
        }
    }

    async fn confirm_output(&self, output: &Place) -> Result<u64, String> {
        match output {
            Place::Local(path) => match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => Ok(meta.len()),
                _ => Err(format!(
                    "translated artifact not found at {}",
                    path.display()
                )),
            },
            Place::Blob { container, key } => match &self.store {
                Some(store) => match store.head(container, key).await {
                    Ok(Some(size)) => Ok(size),
                    Ok(None) => Err(format!(
                        "translated artifact not found at {}/{}",
                        container, key
                    )),
                    Err(e) => Err(e.to_string()),
                },
                None => Err("blob output requested but blob storage is not configured".to_string()),
            },
        }
    }
}

/// Well-formedness checks before anything is submitted
fn validate(job: &TranslationJob) -> Option<String> {
    if job.target.is_auto() {
        return Some("target language cannot be 'auto'".to_string());
    }
    if job.source.place.extension() != job.output.extension() {
        return Some(format!(
            "output extension does not match source: {} vs {}",
            job.output.file_name(),
            job.source.place.file_name()
        ));
    }
    None
}
