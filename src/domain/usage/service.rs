use crate::domain::plan::{Plan, PlanPolicy};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::UsageStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Metered-usage accounting against per-plan character caps.
///
/// The cap checks before a job starts are advisory; authoritative recording
/// happens once, after successful synthesis, with the real post-translation
/// character count. Under concurrency this allows a transient overshoot
/// bounded by the number of in-flight jobs for one user - accepted behavior,
/// see DESIGN notes.
pub struct QuotaService {
    store: Arc<dyn UsageStore>,
    policy: Arc<PlanPolicy>,
}

impl QuotaService {
    pub fn new(store: Arc<dyn UsageStore>, policy: Arc<PlanPolicy>) -> Self {
        Self { store, policy }
    }

    /// UTC month key, e.g. "2026-08".
    fn month_key() -> String {
        Utc::now().format("%Y-%m").to_string()
    }

    /// UTC day key, e.g. "2026-08-23".
    fn day_key() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    pub async fn current_monthly(&self, user_id: Uuid) -> AppResult<i64> {
        self.store
            .current_monthly(user_id, &Self::month_key())
            .await
    }

    pub async fn current_daily(&self, user_id: Uuid) -> AppResult<i64> {
        self.store.current_daily(user_id, &Self::day_key()).await
    }

    /// Fails with a payment-required signal if `planned_chars` would push
    /// this month's usage past the plan cap.
    pub async fn ensure_within_monthly_cap(
        &self,
        user_id: Uuid,
        plan: Plan,
        planned_chars: i64,
    ) -> AppResult<()> {
        let Some(cap) = self.policy.monthly_cap_for(plan) else {
            return Ok(());
        };
        let used = self.current_monthly(user_id).await?;
        if used + planned_chars > cap {
            let remaining = (cap - used).max(0);
            return Err(AppError::PaymentRequired(format!(
                "Monthly synthesis limit reached. Remaining={remaining} chars, requested={planned_chars}"
            )));
        }
        Ok(())
    }

    /// Fails with a retryable limit signal if `planned_chars` would push
    /// today's usage past the plan cap.
    pub async fn ensure_within_daily_cap(
        &self,
        user_id: Uuid,
        plan: Plan,
        planned_chars: i64,
    ) -> AppResult<()> {
        let Some(cap) = self.policy.daily_cap_for(plan) else {
            return Ok(());
        };
        let used = self.current_daily(user_id).await?;
        if used + planned_chars > cap {
            let remaining = (cap - used).max(0);
            return Err(AppError::RateLimitExceeded(format!(
                "Daily synthesis limit reached. Remaining={remaining} chars, requested={planned_chars}"
            )));
        }
        Ok(())
    }

    /// Record real usage into both windows. Called exactly once per
    /// successful job; never for failed jobs.
    pub async fn record_usage(&self, user_id: Uuid, delta_chars: i64) -> AppResult<()> {
        let delta_chars = delta_chars.max(0);
        if delta_chars == 0 {
            return Ok(());
        }
        let monthly = self
            .store
            .add_monthly(user_id, &Self::month_key(), delta_chars)
            .await?;
        let daily = self
            .store
            .add_daily(user_id, &Self::day_key(), delta_chars)
            .await?;
        tracing::debug!(
            user_id = %user_id,
            delta_chars = delta_chars,
            monthly_total = monthly,
            daily_total = daily,
            "Usage recorded"
        );
        Ok(())
    }
}
