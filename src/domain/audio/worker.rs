use super::dispatcher::TtsJob;
use crate::domain::plan::PlanPolicy;
use crate::domain::tts::chunker::normalize_whitespace;
use crate::domain::tts::{join_mp3, split_by_sentences, AudioFormat, RoutingBackend, SynthesisRequest};
use crate::domain::usage::QuotaService;
use crate::error::{AppError, AppResult};
use crate::infrastructure::extract::TextExtractor;
use crate::infrastructure::repositories::DocumentStore;
use crate::infrastructure::storage::StorageService;
use crate::infrastructure::translate::TranslateService;
use std::sync::Arc;
use uuid::Uuid;

/// Executes one synthesis job end to end: fetch, extract, cap, translate,
/// segment, synthesize, assemble, store, account, finalize.
///
/// Every job that was claimed reaches exactly one terminal status. `run`
/// holds the happy path; `process` turns any error into a FAILED document
/// with the reason recorded, so a worker task never dies on a bad job.
pub struct DocumentAudioWorker {
    documents: Arc<dyn DocumentStore>,
    storage: Arc<dyn StorageService>,
    extractor: Arc<dyn TextExtractor>,
    translator: Arc<dyn TranslateService>,
    router: Arc<RoutingBackend>,
    quota: Arc<QuotaService>,
    policy: Arc<PlanPolicy>,
}

impl DocumentAudioWorker {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn StorageService>,
        extractor: Arc<dyn TextExtractor>,
        translator: Arc<dyn TranslateService>,
        router: Arc<RoutingBackend>,
        quota: Arc<QuotaService>,
        policy: Arc<PlanPolicy>,
    ) -> Self {
        Self {
            documents,
            storage,
            extractor,
            translator,
            router,
            quota,
            policy,
        }
    }

    pub async fn process(&self, job: TtsJob) {
        let document_id = job.document_id;
        tracing::info!(
            document_id = %document_id,
            user_id = %job.user_id,
            voice = %job.voice,
            engine = %job.engine,
            "Audio job started"
        );

        if let Err(err) = self.run(&job).await {
            tracing::error!(
                document_id = %document_id,
                user_id = %job.user_id,
                error = %err,
                "Audio job failed"
            );
            if let Err(mark_err) = self.documents.mark_failed(document_id, &err.to_string()).await {
                tracing::error!(
                    document_id = %document_id,
                    error = %mark_err,
                    "Could not record job failure"
                );
            }
        }
    }

    async fn run(&self, job: &TtsJob) -> AppResult<()> {
        let document = self
            .documents
            .find_by_id_and_user(job.document_id, job.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", job.document_id)))?;

        let object_key = document
            .object_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::BadRequest("Document has no stored file".to_string()))?;

        let plan = document.plan_at_upload;
        let bytes = self.storage.get_bytes(object_key).await?;
        let raw = self.extractor.extract(&document.mime, &bytes, 0)?;

        let mut text = normalize_whitespace(&raw);
        if text.is_empty() {
            return Err(AppError::BadRequest(
                "Document contains no readable text".to_string(),
            ));
        }
        text = cap_chars(text, self.policy.tts_max_chars_for(plan));

        if let Some(target) = job.target_lang.as_deref() {
            let translated = self.translator.translate(&text, "auto", target).await?;
            text = cap_chars(
                normalize_whitespace(&translated),
                self.policy.tts_max_chars_for(plan),
            );
            if text.is_empty() {
                return Err(AppError::BadRequest(
                    "Translation produced no text".to_string(),
                ));
            }
        }

        // Authoritative count: what we actually send to the synthesizer.
        let final_chars = text.chars().count() as i64;

        // The pre-start check may be stale by the time a queued job runs.
        if !job.unlimited {
            self.quota
                .ensure_within_daily_cap(job.user_id, plan, final_chars)
                .await?;
        }

        let segments = split_by_sentences(&text, self.policy.safe_chunk_chars);
        tracing::info!(
            document_id = %job.document_id,
            chars = final_chars,
            segments = segments.len(),
            "Synthesizing document"
        );

        let mut parts: Vec<Vec<u8>> = Vec::with_capacity(segments.len());
        for segment in &segments {
            let request = SynthesisRequest {
                plan,
                text: segment.content.clone(),
                voice: job.voice.clone(),
                engine: job.engine,
                format: job.format,
                language: job.target_lang.clone(),
            };
            let audio = self.router.synthesize(&request).await.map_err(|err| {
                tracing::error!(
                    document_id = %job.document_id,
                    segment = segment.index,
                    error = %err,
                    "Segment synthesis failed, aborting job"
                );
                AppError::from(err)
            })?;
            parts.push(audio);
        }

        let audio = match job.format {
            AudioFormat::Mp3 => join_mp3(&parts),
            _ => parts.concat(),
        };

        let audio_key = format!(
            "aud/u/{}/{}/{}.{}",
            job.user_id,
            job.document_id,
            Uuid::new_v4(),
            job.format.extension()
        );
        self.storage
            .put(&audio_key, audio, job.format.content_type())
            .await?;

        if !job.unlimited {
            self.quota.record_usage(job.user_id, final_chars).await?;
        }

        self.documents
            .mark_ready(
                job.document_id,
                &audio_key,
                &job.format.to_string(),
                &job.voice,
            )
            .await?;

        tracing::info!(
            document_id = %job.document_id,
            audio_key = %audio_key,
            chars = final_chars,
            "Audio job completed"
        );
        Ok(())
    }
}

/// Character-safe truncation. Counts and cuts by `char`, never by byte.
fn cap_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    tracing::info!(max_chars = max_chars, "Extracted text truncated to plan cap");
    text.chars().take(max_chars).collect()
}
