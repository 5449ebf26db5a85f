use crate::domain::tts::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
pub enum Plan {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "premium")]
    Premium,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::Free => write!(f, "free"),
            Plan::Premium => write!(f, "premium"),
        }
    }
}

/// Per-plan limits and defaults for the synthesis pipeline.
///
/// Values come from `Config::from_env`; the defaults below match the
/// production configuration.
#[derive(Debug, Clone)]
pub struct PlanPolicy {
    /// Hard per-document character cap applied to extracted text.
    pub free_max_chars: usize,
    pub premium_max_chars: usize,
    /// Monthly character caps; `None` means unlimited.
    pub free_monthly_cap: Option<i64>,
    pub premium_monthly_cap: Option<i64>,
    /// Daily character caps; `None` means unlimited.
    pub free_daily_cap: Option<i64>,
    pub premium_daily_cap: Option<i64>,
    /// Conservative chunk size for segmentation, independent of any
    /// provider's own request limit.
    pub safe_chunk_chars: usize,
    pub default_voice: String,
    pub default_engine: Engine,
    /// Max simultaneously PROCESSING jobs per user.
    pub concurrent_max_per_user: i64,
    /// Planned-chars multiplier applied when translation is requested,
    /// since translation can change text length.
    pub translate_multiplier: f64,
    /// Accounts that bypass caps and usage recording entirely.
    pub unlimited_user_ids: Vec<Uuid>,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            free_max_chars: 50_000,
            premium_max_chars: 1_000_000,
            free_monthly_cap: Some(100_000),
            premium_monthly_cap: Some(2_000_000),
            free_daily_cap: Some(20_000),
            premium_daily_cap: Some(200_000),
            safe_chunk_chars: 2_500,
            default_voice: "Joanna".to_string(),
            default_engine: Engine::Standard,
            concurrent_max_per_user: 2,
            translate_multiplier: 1.3,
            unlimited_user_ids: Vec::new(),
        }
    }
}

impl PlanPolicy {
    pub fn is_unlimited(&self, user_id: Uuid) -> bool {
        self.unlimited_user_ids.contains(&user_id)
    }

    /// Per-document extracted-text cap in characters.
    pub fn tts_max_chars_for(&self, plan: Plan) -> usize {
        match plan {
            Plan::Free => self.free_max_chars,
            Plan::Premium => self.premium_max_chars,
        }
    }

    pub fn monthly_cap_for(&self, plan: Plan) -> Option<i64> {
        match plan {
            Plan::Free => self.free_monthly_cap,
            Plan::Premium => self.premium_monthly_cap,
        }
    }

    pub fn daily_cap_for(&self, plan: Plan) -> Option<i64> {
        match plan {
            Plan::Free => self.free_daily_cap,
            Plan::Premium => self.premium_daily_cap,
        }
    }

    /// Whether the plan may use the given engine at all.
    pub fn engine_allowed_for(&self, engine: Engine, plan: Plan) -> bool {
        match engine {
            Engine::Standard => true,
            Engine::Neural => plan == Plan::Premium,
        }
    }

    /// Downgrade a requested engine to whatever the plan actually permits.
    pub fn sanitize_engine_for(&self, engine: Engine, plan: Plan) -> Engine {
        if self.engine_allowed_for(engine, plan) {
            engine
        } else {
            Engine::Standard
        }
    }
}
