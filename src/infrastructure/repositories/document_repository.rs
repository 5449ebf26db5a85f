use crate::domain::document::Document;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Persistence port for documents and their audio-job fields.
///
/// The audio fields are mutated only by the Job Starter and the Orchestrator.
/// `claim_for_processing` is the per-document mutual exclusion point: the
/// status check and the flip to PROCESSING happen in one atomic statement,
/// so two racing starts dispatch at most one job.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: &Document) -> AppResult<()>;

    async fn find_by_id_and_user(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Document>>;

    /// Flip NONE/FAILED to PROCESSING and clear any previous result fields.
    /// Returns `false` when the document is missing or already
    /// PROCESSING/READY.
    async fn claim_for_processing(&self, document_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Undo a claim whose job could not be handed off (queue full). Only a
    /// PROCESSING document is reset, back to NONE.
    async fn release_claim(&self, document_id: Uuid) -> AppResult<()>;

    async fn count_processing_for_user(&self, user_id: Uuid) -> AppResult<i64>;

    async fn mark_ready(
        &self,
        document_id: Uuid,
        audio_key: &str,
        format: &str,
        voice: &str,
    ) -> AppResult<()>;

    /// Terminal failure: result fields cleared, diagnostic message recorded.
    async fn mark_failed(&self, document_id: Uuid, reason: &str) -> AppResult<()>;
}

/// Postgres implementation of [`DocumentStore`].
pub struct PgDocumentRepository {
    pool: Arc<DbPool>,
}

impl PgDocumentRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentRepository {
    async fn insert(&self, document: &Document) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, user_id, filename, mime, object_key, plan_at_upload,
                audio_status, audio_object_key, audio_format, audio_voice,
                audio_error, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(document.id)
        .bind(document.user_id)
        .bind(&document.filename)
        .bind(&document.mime)
        .bind(&document.object_key)
        .bind(document.plan_at_upload)
        .bind(document.audio_status)
        .bind(&document.audio_object_key)
        .bind(&document.audio_format)
        .bind(&document.audio_voice)
        .bind(&document.audio_error)
        .bind(document.uploaded_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find_by_id_and_user(
        &self,
        document_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, user_id, filename, mime, object_key, plan_at_upload,
                   audio_status, audio_object_key, audio_format, audio_voice,
                   audio_error, uploaded_at
            FROM documents
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(document)
    }

    async fn claim_for_processing(&self, document_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET audio_status = 'processing',
                audio_object_key = NULL,
                audio_format = NULL,
                audio_voice = NULL,
                audio_error = NULL
            WHERE id = $1 AND user_id = $2
              AND audio_status NOT IN ('processing', 'ready')
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_claim(&self, document_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET audio_status = 'none'
            WHERE id = $1 AND audio_status = 'processing'
            "#,
        )
        .bind(document_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn count_processing_for_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM documents
            WHERE user_id = $1 AND audio_status = 'processing'
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn mark_ready(
        &self,
        document_id: Uuid,
        audio_key: &str,
        format: &str,
        voice: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET audio_status = 'ready',
                audio_object_key = $2,
                audio_format = $3,
                audio_voice = $4,
                audio_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .bind(audio_key)
        .bind(format)
        .bind(voice)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, document_id: Uuid, reason: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET audio_status = 'failed',
                audio_object_key = NULL,
                audio_format = NULL,
                audio_voice = NULL,
                audio_error = $2
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .bind(reason)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
