//! In-memory store implementations.
//!
//! Used by local runs and the integration tests; single-process equivalents
//! of the Postgres repositories with the same atomicity guarantees (the
//! DashMap shard lock plays the role of the row lock).

use super::{DocumentStore, UsageStore};
use crate::domain::document::{AudioStatus, Document};
use crate::error::AppResult;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<Uuid, Document>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: &Document) -> AppResult<()> {
        self.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_by_id_and_user(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Document>> {
        Ok(self
            .documents
            .get(&document_id)
            .filter(|doc| doc.user_id == user_id)
            .map(|doc| doc.clone()))
    }

    async fn claim_for_processing(&self, document_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        // get_mut holds the shard lock, making check-then-flip atomic
        let Some(mut doc) = self.documents.get_mut(&document_id) else {
            return Ok(false);
        };
        if doc.user_id != user_id
            || matches!(doc.audio_status, AudioStatus::Processing | AudioStatus::Ready)
        {
            return Ok(false);
        }
        doc.audio_status = AudioStatus::Processing;
        doc.audio_object_key = None;
        doc.audio_format = None;
        doc.audio_voice = None;
        doc.audio_error = None;
        Ok(true)
    }

    async fn release_claim(&self, document_id: Uuid) -> AppResult<()> {
        if let Some(mut doc) = self.documents.get_mut(&document_id) {
            if doc.audio_status == AudioStatus::Processing {
                doc.audio_status = AudioStatus::None;
            }
        }
        Ok(())
    }

    async fn count_processing_for_user(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| doc.user_id == user_id && doc.audio_status == AudioStatus::Processing)
            .count() as i64)
    }

    async fn mark_ready(
        &self,
        document_id: Uuid,
        audio_key: &str,
        format: &str,
        voice: &str,
    ) -> AppResult<()> {
        if let Some(mut doc) = self.documents.get_mut(&document_id) {
            doc.audio_status = AudioStatus::Ready;
            doc.audio_object_key = Some(audio_key.to_string());
            doc.audio_format = Some(format.to_string());
            doc.audio_voice = Some(voice.to_string());
            doc.audio_error = None;
        }
        Ok(())
    }

    async fn mark_failed(&self, document_id: Uuid, reason: &str) -> AppResult<()> {
        if let Some(mut doc) = self.documents.get_mut(&document_id) {
            doc.audio_status = AudioStatus::Failed;
            doc.audio_object_key = None;
            doc.audio_format = None;
            doc.audio_voice = None;
            doc.audio_error = Some(reason.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUsageStore {
    monthly: DashMap<(Uuid, String), i64>,
    daily: DashMap<(Uuid, String), i64>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn current_monthly(&self, user_id: Uuid, period: &str) -> AppResult<i64> {
        Ok(self
            .monthly
            .get(&(user_id, period.to_string()))
            .map(|v| *v)
            .unwrap_or(0))
    }

    async fn current_daily(&self, user_id: Uuid, period: &str) -> AppResult<i64> {
        Ok(self
            .daily
            .get(&(user_id, period.to_string()))
            .map(|v| *v)
            .unwrap_or(0))
    }

    async fn add_monthly(&self, user_id: Uuid, period: &str, delta: i64) -> AppResult<i64> {
        let mut entry = self.monthly.entry((user_id, period.to_string())).or_insert(0);
        *entry += delta;
        Ok(*entry)
    }

    async fn add_daily(&self, user_id: Uuid, period: &str, delta: i64) -> AppResult<i64> {
        let mut entry = self.daily.entry((user_id, period.to_string())).or_insert(0);
        *entry += delta;
        Ok(*entry)
    }
}
