// End-to-end pipeline scenarios with mocked external services

use async_trait::async_trait;
use auditflow::config::TranslatorConfig;
use auditflow::routing::{
    ModelError, Query, QueryClassifier, ReportPayload, RouteModel, Router, TranslateWorkflow,
    WorkflowLabel, WorkflowRegistry,
};
use auditflow::translation::{
    Backend, BackendError, HandleKind, ObjectStore, OperationHandle, OperationStatus, Place,
    Stage, StorageError, StorageLocator, TranslationBackend, TranslationJob, TranslationOutcome,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Model stub: either a fixed label or an error forcing the fallback
struct StubModel(Result<&'static str, &'static str>);

#[async_trait]
impl RouteModel for StubModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, ModelError> {
        self.0
            .map(str::to_string)
            .map_err(|e| ModelError(e.to_string()))
    }
}

/// Blob store stub with a fixed set of blobs
struct StubStore {
    blobs: Vec<(String, String, u64)>,
    containers: Vec<String>,
    heads: Mutex<usize>,
}

impl StubStore {
    fn empty() -> Self {
        Self {
            blobs: Vec::new(),
            containers: vec!["documents".to_string(), "translated".to_string()],
            heads: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ObjectStore for StubStore {
    async fn head(&self, container: &str, key: &str) -> Result<Option<u64>, StorageError> {
        *self.heads.lock().unwrap() += 1;
        Ok(self
            .blobs
            .iter()
            .find(|(c, k, _)| c == container && k == key)
            .map(|(_, _, size)| *size))
    }

    async fn list(
        &self,
        container: &str,
        _prefix: Option<&str>,
    ) -> Result<Vec<String>, StorageError> {
        Ok(self
            .blobs
            .iter()
            .filter(|(c, _, _)| c == container)
            .map(|(_, k, _)| k.clone())
            .collect())
    }

    async fn put(
        &self,
        _container: &str,
        _key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    fn containers(&self) -> &[String] {
        &self.containers
    }

    fn url_for(&self, container: &str, key: &str) -> String {
        format!("https://stub/{}/{}", container, key)
    }
}

/// Translation backend stub replaying a scripted poll sequence
struct StubBackend {
    statuses: Mutex<VecDeque<OperationStatus>>,
    bytes: Option<Vec<u8>>,
    jobs: Mutex<Vec<TranslationJob>>,
}

impl StubBackend {
    fn new(statuses: Vec<OperationStatus>, bytes: Option<Vec<u8>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            bytes,
            jobs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TranslationBackend for StubBackend {
    async fn submit(&self, job: &TranslationJob) -> Result<OperationHandle, BackendError> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(OperationHandle {
            id: "op-1".to_string(),
            kind: HandleKind::Remote {
                status_url: "https://stub/op-1".to_string(),
            },
        })
    }

    async fn poll(&self, _handle: &OperationHandle) -> Result<OperationStatus, BackendError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(OperationStatus::running))
    }

    async fn fetch(&self, _handle: &OperationHandle) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.bytes.clone())
    }
}

fn fast_translator_config() -> TranslatorConfig {
    TranslatorConfig {
        poll_interval_secs: 0,
        timeout_secs: 5,
        ..TranslatorConfig::default()
    }
}

fn containers() -> Vec<String> {
    vec!["documents".to_string(), "translated".to_string()]
}

fn router_with_translate(
    model: StubModel,
    locator: StorageLocator,
    backend: Arc<StubBackend>,
    store: Option<Arc<dyn ObjectStore>>,
) -> Router {
    let orchestrator = auditflow::translation::TranslationOrchestrator::new(
        backend,
        store,
        &fast_translator_config(),
    );
    let mut registry = WorkflowRegistry::new();
    registry.register(Arc::new(TranslateWorkflow::new(locator, orchestrator)));
    Router::new(QueryClassifier::new(Arc::new(model)), registry)
}

// Scenario: "translate report.pdf to spanish" with the file present only
// in the second candidate root resolves there and lands the output next
// to the source.
#[tokio::test]
async fn translates_file_found_in_second_root() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let source = second.path().join("report.pdf");
    std::fs::write(&source, b"original pdf bytes").unwrap();

    let locator = StorageLocator::with_roots(
        vec![first.path().to_path_buf(), second.path().to_path_buf()],
        None,
    );
    let backend = Arc::new(StubBackend::new(
        vec![OperationStatus::succeeded()],
        Some(b"hola".to_vec()),
    ));
    let router = router_with_translate(StubModel(Ok("TRANSLATE")), locator, backend.clone(), None);

    let report = router
        .handle(&Query::new("translate report.pdf to spanish"))
        .await;

    assert_eq!(report.label, WorkflowLabel::Translate);
    let expected_output = second.path().join("report_es.pdf");
    match report.payload {
        ReportPayload::Translation(TranslationOutcome::Succeeded { output, .. }) => {
            assert_eq!(output, Place::Local(expected_output.clone()));
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(std::fs::read(&expected_output).unwrap(), b"hola");

    // The job the backend saw carried the resolved source and target
    let jobs = backend.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].source.place, Place::Local(source));
    assert_eq!(jobs[0].target.code, "es");
    assert!(jobs[0].source_language.is_auto());
}

// Scenario: an explicit container/key reference that does not exist is a
// hard not-found with the searched coordinate in the diagnostic, and no
// fallback search happens.
#[tokio::test]
async fn explicit_blob_path_miss_is_hard_not_found() {
    let store = Arc::new(StubStore::empty());
    let locator = StorageLocator::with_roots(Vec::new(), Some(store.clone()));
    let backend = Arc::new(StubBackend::new(vec![], None));
    let router = router_with_translate(
        StubModel(Ok("TRANSLATE")),
        locator,
        backend.clone(),
        Some(store.clone()),
    );

    let report = router
        .handle(&Query::new("translate documents/contract.pdf to french"))
        .await;

    match report.payload {
        ReportPayload::Translation(TranslationOutcome::Failed { stage, reason }) => {
            assert_eq!(stage, Stage::Locate);
            assert!(reason.contains("documents/contract.pdf"));
        }
        other => panic!("expected locate failure, got {:?}", other),
    }
    // Exactly one existence probe, no listing fallback
    assert_eq!(*store.heads.lock().unwrap(), 1);
    assert!(backend.jobs.lock().unwrap().is_empty());
}

// Scenario: guideline vocabulary routes to GUIDANCE through the keyword
// fallback even when the model call fails.
#[tokio::test]
async fn policy_question_routes_to_guidance_when_model_is_down() {
    let classifier = QueryClassifier::new(Arc::new(StubModel(Err("connection refused"))));
    let router = Router::new(classifier, WorkflowRegistry::new());

    let report = router
        .handle(&Query::new("what are GT's expense approval policies"))
        .await;

    assert_eq!(report.label, WorkflowLabel::Guidance);
}

// Scenario: submit succeeds, poll reports success on the third attempt,
// fetch confirms a 41330-byte artifact at the output location.
#[tokio::test]
async fn blob_translation_succeeds_after_three_polls() {
    let store = Arc::new(StubStore {
        blobs: vec![
            ("documents".to_string(), "contract.pdf".to_string(), 52000),
            ("documents".to_string(), "contract_fr.pdf".to_string(), 41330),
        ],
        containers: containers(),
        heads: Mutex::new(0),
    });
    let locator = StorageLocator::with_roots(Vec::new(), Some(store.clone()));
    let backend = Arc::new(StubBackend::new(
        vec![
            OperationStatus::running(),
            OperationStatus::running(),
            OperationStatus::succeeded(),
        ],
        None,
    ));
    let router = router_with_translate(
        StubModel(Ok("TRANSLATE")),
        locator,
        backend,
        Some(store.clone()),
    );

    let report = router
        .handle(&Query::new("translate documents/contract.pdf to french"))
        .await;

    match report.payload {
        ReportPayload::Translation(TranslationOutcome::Succeeded {
            output,
            byte_size,
            warnings,
        }) => {
            assert_eq!(
                output,
                Place::Blob {
                    container: "documents".to_string(),
                    key: "contract_fr.pdf".to_string(),
                }
            );
            assert_eq!(byte_size, 41330);
            assert!(warnings.is_empty());
        }
        other => panic!("expected success, got {:?}", other),
    }
}

// Without a configured blob store, a container-named relative path is a
// local path: the diagnostic names the filesystem location, not blob
// storage.
#[tokio::test]
async fn container_named_path_is_local_without_store() {
    let locator = StorageLocator::with_roots(Vec::new(), None);
    let backend = Arc::new(StubBackend::new(vec![], None));
    let router = router_with_translate(StubModel(Ok("TRANSLATE")), locator, backend, None);

    let report = router
        .handle(&Query::new("translate documents/contract.pdf to french"))
        .await;

    match report.payload {
        ReportPayload::Translation(TranslationOutcome::Failed { stage, reason }) => {
            assert_eq!(stage, Stage::Locate);
            assert!(reason.contains("documents/contract.pdf"));
            assert!(!reason.contains("blob storage"));
            assert!(!reason.contains("container"));
        }
        other => panic!("expected locate failure, got {:?}", other),
    }
}

// A local-backend hint suppresses the blob fallback for bare filenames
#[tokio::test]
async fn local_backend_hint_suppresses_blob_fallback() {
    let empty = tempfile::tempdir().unwrap();
    let store = Arc::new(StubStore {
        blobs: vec![("documents".to_string(), "report.pdf".to_string(), 10)],
        containers: containers(),
        heads: Mutex::new(0),
    });
    let locator = StorageLocator::with_roots(
        vec![empty.path().to_path_buf()],
        Some(store.clone()),
    );
    let backend = Arc::new(StubBackend::new(vec![], None));
    let router = router_with_translate(
        StubModel(Ok("TRANSLATE")),
        locator,
        backend.clone(),
        Some(store),
    );

    let query = Query::new("translate report.pdf to spanish").with_backend(Backend::Local);
    let report = router.handle(&query).await;

    // The blob copy exists, but the pinned backend keeps the search local
    match report.payload {
        ReportPayload::Translation(TranslationOutcome::Failed { stage, .. }) => {
            assert_eq!(stage, Stage::Locate);
        }
        other => panic!("expected locate failure, got {:?}", other),
    }
    assert!(backend.jobs.lock().unwrap().is_empty());
}

// An unknown target language never reaches the backend
#[tokio::test]
async fn unknown_target_language_fails_before_submit() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("report.pdf"), b"pdf").unwrap();

    let locator = StorageLocator::with_roots(vec![dir.path().to_path_buf()], None);
    let backend = Arc::new(StubBackend::new(vec![], None));
    let router = router_with_translate(StubModel(Ok("TRANSLATE")), locator, backend.clone(), None);

    let report = router
        .handle(&Query::new("translate report.pdf to klingon"))
        .await;

    match report.payload {
        ReportPayload::Translation(TranslationOutcome::Failed { stage, reason }) => {
            assert_eq!(stage, Stage::Locate);
            assert!(reason.contains("klingon"));
        }
        other => panic!("expected locate failure, got {:?}", other),
    }
    assert!(backend.jobs.lock().unwrap().is_empty());
}

// A translate query the grammar cannot parse yields a failure report,
// not a crash
#[tokio::test]
async fn unparseable_translate_request_reports_failure() {
    let locator = StorageLocator::with_roots(Vec::new(), None);
    let backend = Arc::new(StubBackend::new(vec![], None));
    let router = router_with_translate(StubModel(Ok("TRANSLATE")), locator, backend, None);

    let report = router.handle(&Query::new("translate this please")).await;

    assert_eq!(report.label, WorkflowLabel::Translate);
    assert!(matches!(report.payload, ReportPayload::Failure { .. }));
}
