use super::dispatcher::{TtsDispatcher, TtsJob};
use crate::domain::document::{AudioStatus, Document};
use crate::domain::plan::PlanPolicy;
use crate::domain::tts::chunker::normalize_whitespace;
use crate::domain::tts::{AudioFormat, Engine, VoiceCatalog};
use crate::domain::usage::QuotaService;
use crate::error::{AppError, AppResult};
use crate::infrastructure::extract::TextExtractor;
use crate::infrastructure::repositories::DocumentStore;
use crate::infrastructure::storage::StorageService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Caller-supplied synthesis options. Everything is optional; blanks fall
/// back to the plan defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartAudioRequest {
    pub voice: Option<String>,
    pub engine: Option<String>,
    pub format: Option<String>,
    pub target_lang: Option<String>,
}

/// Read model of a document's audio state. `download_ref` is only present
/// once the audio is READY.
#[derive(Debug, Clone, Serialize)]
pub struct AudioStatusView {
    pub status: AudioStatus,
    pub voice: Option<String>,
    pub format: Option<String>,
    pub error: Option<String>,
    pub download_ref: Option<String>,
}

impl AudioStatusView {
    fn of(document: &Document) -> Self {
        let download_ref = if document.audio_status == AudioStatus::Ready {
            document.audio_object_key.clone()
        } else {
            None
        };
        Self {
            status: document.audio_status,
            voice: document.audio_voice.clone(),
            format: document.audio_format.clone(),
            error: document.audio_error.clone(),
            download_ref,
        }
    }
}

/// Validates and admits synthesis jobs, then hands them to the worker pool.
///
/// Starting is idempotent: a document that is already PROCESSING or READY is
/// reported as-is, never re-enqueued. Admission control happens here; the
/// worker re-checks only the daily cap, since queue time can make the
/// pre-check stale.
pub struct DocumentAudioService {
    documents: Arc<dyn DocumentStore>,
    storage: Arc<dyn StorageService>,
    extractor: Arc<dyn TextExtractor>,
    voices: Arc<dyn VoiceCatalog>,
    quota: Arc<QuotaService>,
    dispatcher: Arc<TtsDispatcher>,
    policy: Arc<PlanPolicy>,
}

impl DocumentAudioService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn StorageService>,
        extractor: Arc<dyn TextExtractor>,
        voices: Arc<dyn VoiceCatalog>,
        quota: Arc<QuotaService>,
        dispatcher: Arc<TtsDispatcher>,
        policy: Arc<PlanPolicy>,
    ) -> Self {
        Self {
            documents,
            storage,
            extractor,
            voices,
            quota,
            dispatcher,
            policy,
        }
    }

    pub async fn status(&self, user_id: Uuid, document_id: Uuid) -> AppResult<AudioStatusView> {
        let document = self
            .documents
            .find_by_id_and_user(document_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;
        Ok(AudioStatusView::of(&document))
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        request: StartAudioRequest,
    ) -> AppResult<AudioStatusView> {
        let document = self
            .documents
            .find_by_id_and_user(document_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;

        if !document.has_stored_file() {
            return Err(AppError::BadRequest(
                "Document has no stored file to synthesize".to_string(),
            ));
        }

        if matches!(
            document.audio_status,
            AudioStatus::Processing | AudioStatus::Ready
        ) {
            tracing::debug!(
                document_id = %document_id,
                status = %document.audio_status,
                "Audio already requested, nothing to start"
            );
            return Ok(AudioStatusView::of(&document));
        }

        let in_flight = self.documents.count_processing_for_user(user_id).await?;
        if in_flight >= self.policy.concurrent_max_per_user {
            return Err(AppError::RateLimitExceeded(format!(
                "Too many documents are being processed ({in_flight}), wait for one to finish"
            )));
        }

        let plan = document.plan_at_upload;
        let voice = request
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.policy.default_voice)
            .to_string();
        if !self.voices.contains(&voice) {
            return Err(AppError::BadRequest(format!("Unknown voice: {voice}")));
        }
        let engine = match request.engine.as_deref().map(str::trim) {
            None | Some("") => self.policy.default_engine,
            Some(raw) => Engine::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown engine: {raw}")))?,
        };
        let engine = self.policy.sanitize_engine_for(engine, plan);
        let engine = if self.voices.supports_engine(&voice, engine) {
            engine
        } else {
            tracing::debug!(
                voice = %voice,
                engine = %engine,
                "Voice does not speak the requested engine, using standard"
            );
            Engine::Standard
        };
        let format = AudioFormat::parse_or_mp3(request.format.as_deref().unwrap_or(""));
        let target_lang = normalize_target_lang(request.target_lang.as_deref());

        let unlimited = self.policy.is_unlimited(user_id);
        if !unlimited {
            let planned = self
                .planned_chars(&document, target_lang.is_some())
                .await?;
            self.quota
                .ensure_within_daily_cap(user_id, plan, planned)
                .await?;
            self.quota
                .ensure_within_monthly_cap(user_id, plan, planned)
                .await?;
        }

        if !self
            .documents
            .claim_for_processing(document_id, user_id)
            .await?
        {
            // Lost the race to a concurrent start; report whatever won.
            return self.status(user_id, document_id).await;
        }

        let job = TtsJob {
            user_id,
            document_id,
            voice,
            engine,
            format,
            target_lang,
            unlimited,
        };
        if self.dispatcher.try_dispatch(job).is_err() {
            self.documents.release_claim(document_id).await?;
            return Err(AppError::RateLimitExceeded(
                "Synthesis queue is full, try again later".to_string(),
            ));
        }

        tracing::info!(
            document_id = %document_id,
            user_id = %user_id,
            plan = %plan,
            engine = %engine,
            format = %format,
            "Audio job enqueued"
        );
        self.status(user_id, document_id).await
    }

    /// Advisory size estimate for admission control: extracted text after
    /// normalization and the plan cap, inflated when translation is on
    /// because translated text can grow.
    async fn planned_chars(&self, document: &Document, translating: bool) -> AppResult<i64> {
        let object_key = document.object_key.as_deref().unwrap_or_default();
        let bytes = self.storage.get_bytes(object_key).await?;
        let raw = self.extractor.extract(&document.mime, &bytes, 0)?;
        let cap = self.policy.tts_max_chars_for(document.plan_at_upload);
        let mut chars = normalize_whitespace(&raw).chars().count().min(cap);
        if translating {
            let inflated = (chars as f64 * self.policy.translate_multiplier).ceil() as usize;
            chars = inflated.min(cap);
        }
        Ok(chars as i64)
    }
}

/// `None`, blank, `auto` and `same` all mean "do not translate".
fn normalize_target_lang(raw: Option<&str>) -> Option<String> {
    let lang = raw?.trim().to_lowercase();
    match lang.as_str() {
        "" | "auto" | "same" => None,
        _ => Some(lang),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::worker::DocumentAudioWorker;
    use crate::domain::document::Document;
    use crate::domain::plan::Plan;
    use crate::domain::tts::{RoutingBackend, StaticVoiceCatalog};
    use crate::infrastructure::extract::PlainTextExtractor;
    use crate::infrastructure::repositories::{InMemoryDocumentStore, InMemoryUsageStore};
    use crate::infrastructure::storage::MemoryStorageService;
    use crate::infrastructure::translate::NoopTranslateService;
    use crate::infrastructure::tts::DevTtsBackend;
    use chrono::Utc;
    use std::time::Duration;

    struct Harness {
        service: DocumentAudioService,
        documents: Arc<InMemoryDocumentStore>,
        storage: Arc<MemoryStorageService>,
        quota: Arc<QuotaService>,
    }

    fn harness(policy: PlanPolicy, queue_capacity: usize) -> Harness {
        let policy = Arc::new(policy);
        let documents = Arc::new(InMemoryDocumentStore::new());
        let storage = Arc::new(MemoryStorageService::new());
        let quota = Arc::new(QuotaService::new(
            Arc::new(InMemoryUsageStore::new()),
            policy.clone(),
        ));
        let router = Arc::new(RoutingBackend::new(
            Arc::new(DevTtsBackend),
            None,
            policy.clone(),
            Duration::from_secs(5),
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
        let dispatcher = Arc::new(TtsDispatcher::spawn(worker, 1, queue_capacity));
        let service = DocumentAudioService::new(
            documents.clone(),
            storage.clone(),
            Arc::new(PlainTextExtractor),
            Arc::new(StaticVoiceCatalog::default()),
            quota.clone(),
            dispatcher,
            policy,
        );
        Harness {
            service,
            documents,
            storage,
            quota,
        }
    }

    async fn seed_document(h: &Harness, user_id: Uuid, body: &str) -> Document {
        let id = Uuid::new_v4();
        let key = format!("doc/{id}.txt");
        h.storage
            .put(&key, body.as_bytes().to_vec(), "text/plain")
            .await
            .unwrap();
        let document = Document {
            id,
            user_id,
            filename: "notes.txt".to_string(),
            mime: "text/plain".to_string(),
            object_key: Some(key),
            plan_at_upload: Plan::Free,
            audio_status: AudioStatus::None,
            audio_object_key: None,
            audio_format: None,
            audio_voice: None,
            audio_error: None,
            uploaded_at: Utc::now(),
        };
        h.documents.insert(&document).await.unwrap();
        document
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let h = harness(PlanPolicy::default(), 8);
        let err = h
            .service
            .start(Uuid::new_v4(), Uuid::new_v4(), StartAudioRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn document_without_stored_file_is_rejected() {
        let h = harness(PlanPolicy::default(), 8);
        let user = Uuid::new_v4();
        let mut document = seed_document(&h, user, "text").await;
        document.object_key = None;
        document.id = Uuid::new_v4();
        h.documents.insert(&document).await.unwrap();

        let err = h
            .service
            .start(user, document.id, StartAudioRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn start_claims_and_enqueues() {
        let h = harness(PlanPolicy::default(), 8);
        let user = Uuid::new_v4();
        let document = seed_document(&h, user, "Some sentence to read aloud.").await;

        let view = h
            .service
            .start(user, document.id, StartAudioRequest::default())
            .await
            .unwrap();
        assert_eq!(view.status, AudioStatus::Processing);
        assert!(view.download_ref.is_none());
    }

    #[tokio::test]
    async fn ready_document_start_is_a_no_op() {
        let h = harness(PlanPolicy::default(), 8);
        let user = Uuid::new_v4();
        let document = seed_document(&h, user, "text").await;
        h.documents
            .mark_ready(document.id, "aud/u/x/y/z.mp3", "mp3", "Joanna")
            .await
            .unwrap();

        let view = h
            .service
            .start(user, document.id, StartAudioRequest::default())
            .await
            .unwrap();
        assert_eq!(view.status, AudioStatus::Ready);
        assert_eq!(view.download_ref.as_deref(), Some("aud/u/x/y/z.mp3"));
    }

    #[tokio::test]
    async fn unknown_engine_is_a_bad_request() {
        let h = harness(PlanPolicy::default(), 8);
        let user = Uuid::new_v4();
        let document = seed_document(&h, user, "text").await;

        let err = h
            .service
            .start(
                user,
                document.id,
                StartAudioRequest {
                    engine: Some("turbo".to_string()),
                    ..StartAudioRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_voice_is_rejected_before_claiming() {
        let h = harness(PlanPolicy::default(), 8);
        let user = Uuid::new_v4();
        let document = seed_document(&h, user, "text").await;

        let err = h
            .service
            .start(
                user,
                document.id,
                StartAudioRequest {
                    voice: Some("NotAVoice".to_string()),
                    ..StartAudioRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let view = h.service.status(user, document.id).await.unwrap();
        assert_eq!(view.status, AudioStatus::None);
    }

    #[tokio::test]
    async fn standard_only_voice_with_neural_request_still_starts() {
        let h = harness(PlanPolicy::default(), 8);
        let user = Uuid::new_v4();
        let mut document = seed_document(&h, user, "text").await;
        // premium, so the neural request survives the plan gate and it is
        // the voice check that must downgrade
        document.plan_at_upload = Plan::Premium;
        h.documents.insert(&document).await.unwrap();

        // engine is downgraded to what the voice speaks, not rejected
        let view = h
            .service
            .start(
                user,
                document.id,
                StartAudioRequest {
                    voice: Some("Conchita".to_string()),
                    engine: Some("neural".to_string()),
                    ..StartAudioRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.status, AudioStatus::Processing);
    }

    #[tokio::test]
    async fn concurrency_limit_rejects_with_retryable_error() {
        let h = harness(
            PlanPolicy {
                concurrent_max_per_user: 1,
                ..PlanPolicy::default()
            },
            8,
        );
        let user = Uuid::new_v4();
        let first = seed_document(&h, user, "first").await;
        let second = seed_document(&h, user, "second").await;

        h.documents
            .claim_for_processing(first.id, user)
            .await
            .unwrap();

        let err = h
            .service
            .start(user, second.id, StartAudioRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn monthly_cap_rejects_before_claiming() {
        let h = harness(
            PlanPolicy {
                free_monthly_cap: Some(100),
                ..PlanPolicy::default()
            },
            8,
        );
        let user = Uuid::new_v4();
        h.quota.record_usage(user, 95).await.unwrap();
        let document = seed_document(&h, user, "More than five characters for sure.").await;

        let err = h
            .service
            .start(user, document.id, StartAudioRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(_)));

        let view = h.service.status(user, document.id).await.unwrap();
        assert_eq!(view.status, AudioStatus::None);
    }

    #[tokio::test]
    async fn translation_inflates_the_planned_size() {
        // 30 chars fits a 35-char daily cap, but 30 * 1.3 = 39 does not.
        let body = "abcdefghijklmnopqrstuvwxyz1234";
        assert_eq!(body.chars().count(), 30);
        let h = harness(
            PlanPolicy {
                free_daily_cap: Some(35),
                ..PlanPolicy::default()
            },
            8,
        );
        let user = Uuid::new_v4();
        let document = seed_document(&h, user, body).await;

        let err = h
            .service
            .start(
                user,
                document.id,
                StartAudioRequest {
                    target_lang: Some("es".to_string()),
                    ..StartAudioRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded(_)));

        let plain = h
            .service
            .start(user, document.id, StartAudioRequest::default())
            .await
            .unwrap();
        assert_eq!(plain.status, AudioStatus::Processing);
    }

    #[tokio::test]
    async fn full_queue_releases_the_claim() {
        // Single-slot queue on a current-thread runtime: the worker task has
        // not run yet, so the second dispatch sees a full queue.
        let h = harness(
            PlanPolicy {
                concurrent_max_per_user: 10,
                ..PlanPolicy::default()
            },
            1,
        );
        let user = Uuid::new_v4();
        let first = seed_document(&h, user, "first").await;
        let second = seed_document(&h, user, "second").await;

        h.service
            .start(user, first.id, StartAudioRequest::default())
            .await
            .unwrap();
        let err = h
            .service
            .start(user, second.id, StartAudioRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded(_)));

        let view = h.service.status(user, second.id).await.unwrap();
        assert_eq!(view.status, AudioStatus::None);
    }

    #[test]
    fn target_lang_normalization() {
        assert_eq!(normalize_target_lang(None), None);
        assert_eq!(normalize_target_lang(Some("  ")), None);
        assert_eq!(normalize_target_lang(Some("auto")), None);
        assert_eq!(normalize_target_lang(Some("SAME")), None);
        assert_eq!(normalize_target_lang(Some(" ES ")), Some("es".to_string()));
    }
}
