use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Persistence port for per-user character usage counters.
///
/// Counters are keyed `(user_id, period_key)` with separate daily and
/// monthly granularities, and only ever grow. Increments must be atomic at
/// the storage layer (additive upsert, never read-modify-write in
/// application memory) so that concurrent jobs for the same user lose no
/// updates.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn current_monthly(&self, user_id: Uuid, period: &str) -> AppResult<i64>;

    async fn current_daily(&self, user_id: Uuid, period: &str) -> AppResult<i64>;

    /// Add `delta` characters to the monthly counter, returning the new
    /// total.
    async fn add_monthly(&self, user_id: Uuid, period: &str, delta: i64) -> AppResult<i64>;

    /// Add `delta` characters to the daily counter, returning the new total.
    async fn add_daily(&self, user_id: Uuid, period: &str, delta: i64) -> AppResult<i64>;
}

/// Postgres implementation of [`UsageStore`] over the `tts_usage` (monthly)
/// and `tts_usage_day` (daily) tables.
pub struct PgUsageRepository {
    pool: Arc<DbPool>,
}

impl PgUsageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageRepository {
    async fn current_monthly(&self, user_id: Uuid, period: &str) -> AppResult<i64> {
        let used: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT chars_used FROM tts_usage
            WHERE user_id = $1 AND period_ym = $2
            "#,
        )
        .bind(user_id)
        .bind(period)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(used.unwrap_or(0))
    }

    async fn current_daily(&self, user_id: Uuid, period: &str) -> AppResult<i64> {
        let used: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT chars_used FROM tts_usage_day
            WHERE user_id = $1 AND period_ymd = $2
            "#,
        )
        .bind(user_id)
        .bind(period)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(used.unwrap_or(0))
    }

    async fn add_monthly(&self, user_id: Uuid, period: &str, delta: i64) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tts_usage (user_id, period_ym, chars_used, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, period_ym)
            DO UPDATE SET
                chars_used = tts_usage.chars_used + EXCLUDED.chars_used,
                updated_at = NOW()
            RETURNING chars_used
            "#,
        )
        .bind(user_id)
        .bind(period)
        .bind(delta)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(total)
    }

    async fn add_daily(&self, user_id: Uuid, period: &str, delta: i64) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tts_usage_day (user_id, period_ymd, chars_used, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, period_ymd)
            DO UPDATE SET
                chars_used = tts_usage_day.chars_used + EXCLUDED.chars_used,
                updated_at = NOW()
            RETURNING chars_used
            "#,
        )
        .bind(user_id)
        .bind(period)
        .bind(delta)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(total)
    }
}
