//! Shared fixture for the pipeline integration tests.
//!
//! Everything runs in-process: in-memory stores, in-memory object storage
//! and a recording synthesis backend, wired together exactly like the
//! production composition. Tests drive the real services and workers.

use async_trait::async_trait;
use chrono::Utc;
use papervox_backend::domain::audio::{
    DocumentAudioService, DocumentAudioWorker, TtsDispatcher,
};
use papervox_backend::domain::document::{AudioStatus, Document};
use papervox_backend::domain::plan::{Plan, PlanPolicy};
use papervox_backend::domain::tts::{
    RoutingBackend, StaticVoiceCatalog, SynthesisRequest, TtsBackend, TtsError,
};
use papervox_backend::domain::usage::QuotaService;
use papervox_backend::infrastructure::extract::PlainTextExtractor;
use papervox_backend::infrastructure::repositories::{
    DocumentStore, InMemoryDocumentStore, InMemoryUsageStore, UsageStore,
};
use papervox_backend::infrastructure::storage::{MemoryStorageService, StorageService};
use papervox_backend::infrastructure::translate::NoopTranslateService;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Test double for a synthesis provider. Records every synthesized text,
/// optionally fails any segment containing a marker substring, and can wrap
/// its output in an ID3v2 header to exercise MP3 assembly.
pub struct RecordingBackend {
    calls: AtomicU32,
    texts: Mutex<Vec<String>>,
    fail_on: Option<(&'static str, u16)>,
    wrap_id3: bool,
}

impl RecordingBackend {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            texts: Mutex::new(Vec::new()),
            fail_on: None,
            wrap_id3: false,
        })
    }

    /// Any segment containing `marker` fails with the given provider status.
    pub fn failing_on(marker: &'static str, status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            texts: Mutex::new(Vec::new()),
            fail_on: Some((marker, status)),
            wrap_id3: false,
        })
    }

    pub fn with_id3_headers() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            texts: Mutex::new(Vec::new()),
            fail_on: None,
            wrap_id3: true,
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(request.text.clone());
        if let Some((marker, status)) = self.fail_on {
            if request.text.contains(marker) {
                return Err(TtsError::Provider {
                    status,
                    message: "scripted provider failure".to_string(),
                });
            }
        }
        if self.wrap_id3 {
            // 10-byte header plus 10 bytes of tag payload, synch-safe size
            let mut bytes = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 10];
            bytes.extend_from_slice(&[0xAA; 10]);
            bytes.extend_from_slice(request.text.as_bytes());
            return Ok(bytes);
        }
        Ok(request.text.clone().into_bytes())
    }
}

pub struct TestApp {
    pub documents: Arc<InMemoryDocumentStore>,
    pub storage: Arc<MemoryStorageService>,
    pub usage: Arc<InMemoryUsageStore>,
    pub service: DocumentAudioService,
    pub backend: Arc<RecordingBackend>,
}

impl TestApp {
    pub fn new(policy: PlanPolicy) -> Self {
        Self::with_backend(policy, RecordingBackend::healthy())
    }

    pub fn with_backend(policy: PlanPolicy, backend: Arc<RecordingBackend>) -> Self {
        let policy = Arc::new(policy);
        let documents = Arc::new(InMemoryDocumentStore::new());
        let storage = Arc::new(MemoryStorageService::new());
        let usage = Arc::new(InMemoryUsageStore::new());
        let quota = Arc::new(QuotaService::new(usage.clone(), policy.clone()));
        let router = Arc::new(RoutingBackend::new(
            backend.clone(),
            None,
            policy.clone(),
            Duration::from_secs(30),
        ));
        let worker = Arc::new(DocumentAudioWorker::new(
            documents.clone(),
            storage.clone(),
            Arc::new(PlainTextExtractor),
            Arc::new(NoopTranslateService),
            router,
            quota.clone(),
            policy.clone(),
        ));
        let dispatcher = Arc::new(TtsDispatcher::spawn(worker, 2, 16));
        let service = DocumentAudioService::new(
            documents.clone(),
            storage.clone(),
            Arc::new(PlainTextExtractor),
            Arc::new(StaticVoiceCatalog::default()),
            quota.clone(),
            dispatcher,
            policy,
        );
        Self {
            documents,
            storage,
            usage,
            service,
            backend,
        }
    }

    /// Upload a plain-text document for `user` and register it with no
    /// audio yet.
    pub async fn upload_document(
        &self,
        user_id: Uuid,
        plan: Plan,
        body: &str,
    ) -> anyhow::Result<Document> {
        let id = Uuid::new_v4();
        let object_key = format!("doc/u/{user_id}/{id}.txt");
        self.storage
            .put(&object_key, body.as_bytes().to_vec(), "text/plain")
            .await?;
        let document = Document {
            id,
            user_id,
            filename: "paper.txt".to_string(),
            mime: "text/plain".to_string(),
            object_key: Some(object_key),
            plan_at_upload: plan,
            audio_status: AudioStatus::None,
            audio_object_key: None,
            audio_format: None,
            audio_voice: None,
            audio_error: None,
            uploaded_at: Utc::now(),
        };
        self.documents.insert(&document).await?;
        Ok(document)
    }

    /// Poll until the document leaves PROCESSING. Meant for paused-clock
    /// tests, where the sleeps auto-advance.
    pub async fn wait_for_terminal(&self, user_id: Uuid, document_id: Uuid) -> Document {
        for _ in 0..10_000 {
            let document = self
                .documents
                .find_by_id_and_user(document_id, user_id)
                .await
                .unwrap()
                .unwrap();
            match document.audio_status {
                AudioStatus::Ready | AudioStatus::Failed => return document,
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
        panic!("document {document_id} never reached a terminal status");
    }

    pub async fn monthly_usage(&self, user_id: Uuid) -> i64 {
        self.usage
            .current_monthly(user_id, &Utc::now().format("%Y-%m").to_string())
            .await
            .unwrap()
    }

    pub async fn daily_usage(&self, user_id: Uuid) -> i64 {
        self.usage
            .current_daily(user_id, &Utc::now().format("%Y-%m-%d").to_string())
            .await
            .unwrap()
    }
}
