// Azure Document Translation backend - batch API for blob-to-blob jobs,
// synchronous single-document API for local sources

use super::blob::ObjectStore;
use super::orchestrator::{
    BackendError, HandleKind, OperationHandle, OperationState, OperationStatus,
    TranslationBackend, TranslationJob,
};
use super::reference::Place;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "2024-05-01";

/// Translation client addressed by endpoint + subscription key. Blob
/// jobs go through the asynchronous batch API and are delivered by the
/// service straight to the target blob; local sources go through the
/// single-document API, which returns the translated bytes in the
/// response body.
pub struct AzureDocumentTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    store: Option<Arc<dyn ObjectStore>>,
}

impl AzureDocumentTranslator {
    pub fn new(endpoint: &str, api_key: &str, store: Option<Arc<dyn ObjectStore>>) -> Self {
        // Single-document calls carry the artifact in the response, so
        // the per-request ceiling has to accommodate the whole job
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            store,
        }
    }

    async fn submit_batch(
        &self,
        job: &TranslationJob,
        source: (&str, &str),
        target: (&str, &str),
    ) -> Result<OperationHandle, BackendError> {
        let store = self.store.as_ref().ok_or_else(|| {
            BackendError("blob translation requested but blob storage is not configured".into())
        })?;

        let request = BatchRequest {
            inputs: vec![BatchInput {
                source: BatchSource {
                    source_url: store.url_for(source.0, source.1),
                    language: batch_language(&job.source_language.code),
                },
                targets: vec![BatchTarget {
                    target_url: store.url_for(target.0, target.1),
                    language: job.target.code.clone(),
                }],
            }],
        };

        let url = format!(
            "{}/translator/document/batches?api-version={}",
            self.endpoint, API_VERSION
        );
        let response = self
            .client
            .post(url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError(format!("batch submit failed: {}", e)))?;

        if response.status().as_u16() != 202 {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError(format!(
                "batch submit returned {}: {}",
                status, body
            )));
        }

        let status_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| {
                BackendError("batch submit response missing Operation-Location".into())
            })?;

        let id = status_url
            .rsplit('/')
            .next()
            .unwrap_or("unknown")
            .split('?')
            .next()
            .unwrap_or("unknown")
            .to_string();
        debug!(%id, "batch translation accepted");

        Ok(OperationHandle {
            id,
            kind: HandleKind::Remote { status_url },
        })
    }

    async fn submit_single_document(
        &self,
        job: &TranslationJob,
        path: &std::path::Path,
    ) -> Result<OperationHandle, BackendError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BackendError(format!("could not read {}: {}", path.display(), e)))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(job.source.place.file_name())
            .mime_str(&job.source.content_type)
            .map_err(|e| BackendError(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("document", part);

        let mut url = format!(
            "{}/translator/document:translate?api-version={}&targetLanguage={}",
            self.endpoint, API_VERSION, job.target.code
        );
        if !job.source_language.is_auto() {
            url.push_str(&format!("&sourceLanguage={}", job.source_language.code));
        }

        let response = self
            .client
            .post(url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError(format!("document translate failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError(format!(
                "document translate returned {}: {}",
                status, body
            )));
        }

        let translated = response
            .bytes()
            .await
            .map_err(|e| BackendError(format!("reading translated document failed: {}", e)))?;

        Ok(OperationHandle {
            id: format!("inline:{}", job.source.place.file_name()),
            kind: HandleKind::Inline {
                bytes: Arc::new(translated.to_vec()),
            },
        })
    }
}

#[async_trait]
impl TranslationBackend for AzureDocumentTranslator {
    async fn submit(&self, job: &TranslationJob) -> Result<OperationHandle, BackendError> {
        match (&job.source.place, &job.output) {
            (
                Place::Blob { container, key },
                Place::Blob {
                    container: out_container,
                    key: out_key,
                },
            ) => {
                self.submit_batch(job, (container, key), (out_container, out_key))
                    .await
            }
            (Place::Local(path), _) => self.submit_single_document(job, path).await,
            (Place::Blob { .. }, Place::Local(_)) => Err(BackendError(
                "blob sources can only be translated to a blob output".into(),
            )),
        }
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, BackendError> {
        let status_url = match &handle.kind {
            // Single-document jobs finish during submit
            HandleKind::Inline { .. } => return Ok(OperationStatus::succeeded()),
            HandleKind::Remote { status_url } => status_url,
        };

        let response = self
            .client
            .get(status_url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| BackendError(format!("status poll failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BackendError(format!(
                "status poll returned {}",
                response.status()
            )));
        }

        let batch: BatchStatus = response
            .json()
            .await
            .map_err(|e| BackendError(format!("malformed status response: {}", e)))?;

        Ok(map_status(&batch))
    }

    async fn fetch(&self, handle: &OperationHandle) -> Result<Option<Vec<u8>>, BackendError> {
        match &handle.kind {
            HandleKind::Inline { bytes } => Ok(Some(bytes.as_ref().clone())),
            // Batch jobs are delivered by the service to the target blob
            HandleKind::Remote { .. } => Ok(None),
        }
    }
}

/// `auto` means "let the service detect"; the API expects the field to
/// be absent in that case.
fn batch_language(code: &str) -> Option<String> {
    if code == "auto" {
        None
    } else {
        Some(code.to_string())
    }
}

fn map_status(batch: &BatchStatus) -> OperationStatus {
    let detail = batch.error.as_ref().map(|e| e.message.clone());
    match batch.status.as_str() {
        "Succeeded" => {
            let mut status = OperationStatus::succeeded();
            if let Some(summary) = &batch.summary {
                if summary.failed > 0 {
                    status.warnings.push(format!(
                        "{} of {} documents failed to translate",
                        summary.failed, summary.total
                    ));
                }
            }
            status
        }
        "Failed" | "ValidationFailed" => {
            OperationStatus::failed(detail.unwrap_or_else(|| batch.status.clone()))
        }
        "Cancelled" | "Canceled" => OperationStatus {
            state: OperationState::Canceled,
            detail,
            warnings: Vec::new(),
        },
        "NotStarted" => OperationStatus {
            state: OperationState::NotStarted,
            detail: None,
            warnings: Vec::new(),
        },
        // Running, Cancelling and anything the API adds later
        _ => OperationStatus::running(),
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest {
    inputs: Vec<BatchInput>,
}

#[derive(Debug, Serialize)]
struct BatchInput {
    source: BatchSource,
    targets: Vec<BatchTarget>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchSource {
    source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchTarget {
    target_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct BatchStatus {
    status: String,
    error: Option<BatchStatusError>,
    summary: Option<BatchSummary>,
}

#[derive(Debug, Deserialize)]
struct BatchStatusError {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BatchSummary {
    total: u64,
    failed: u64,
}
