use crate::domain::plan::PlanPolicy;
use crate::domain::tts::Engine;
use serde::Deserialize;
use std::env;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub aws_region: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // TTS pipeline
    pub tts_worker_count: usize,
    pub tts_queue_capacity: usize,
    pub tts_call_timeout_ms: u64,
    pub tts_safe_chunk_chars: usize,
    pub tts_default_voice: String,
    pub tts_default_engine: Engine,
    pub tts_free_max_chars: usize,
    pub tts_premium_max_chars: usize,
    pub tts_free_monthly_cap: Option<i64>,
    pub tts_premium_monthly_cap: Option<i64>,
    pub tts_free_daily_cap: Option<i64>,
    pub tts_premium_daily_cap: Option<i64>,
    pub tts_concurrent_max_per_user: i64,
    pub tts_translate_multiplier: f64,
    pub tts_unlimited_user_ids: Vec<Uuid>,
    // Premium provider (optional)
    pub speechify_base_url: Option<String>,
    pub speechify_api_key: Option<String>,
    pub speechify_default_voice: String,
    // Translation (optional)
    pub translate_base_url: Option<String>,
    pub translate_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            tts_worker_count: env::var("TTS_WORKER_COUNT")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            tts_queue_capacity: env::var("TTS_QUEUE_CAPACITY")
                .unwrap_or_else(|_| "64".to_string())
                .parse()?,
            tts_call_timeout_ms: env::var("TTS_CALL_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()?,
            tts_safe_chunk_chars: env::var("TTS_SAFE_CHUNK_CHARS")
                .unwrap_or_else(|_| "2500".to_string())
                .parse()?,
            tts_default_voice: env::var("TTS_DEFAULT_VOICE")
                .unwrap_or_else(|_| "Joanna".to_string()),
            tts_default_engine: env::var("TTS_DEFAULT_ENGINE")
                .ok()
                .and_then(|s| Engine::parse(&s))
                .unwrap_or(Engine::Standard),
            tts_free_max_chars: env::var("TTS_FREE_MAX_CHARS")
                .unwrap_or_else(|_| "50000".to_string())
                .parse()?,
            tts_premium_max_chars: env::var("TTS_PREMIUM_MAX_CHARS")
                .unwrap_or_else(|_| "1000000".to_string())
                .parse()?,
            tts_free_monthly_cap: parse_cap("TTS_FREE_MONTHLY_CAP", 100_000)?,
            tts_premium_monthly_cap: parse_cap("TTS_PREMIUM_MONTHLY_CAP", 2_000_000)?,
            tts_free_daily_cap: parse_cap("TTS_FREE_DAILY_CAP", 20_000)?,
            tts_premium_daily_cap: parse_cap("TTS_PREMIUM_DAILY_CAP", 200_000)?,
            tts_concurrent_max_per_user: env::var("TTS_CONCURRENT_MAX_PER_USER")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            tts_translate_multiplier: env::var("TTS_TRANSLATE_MULTIPLIER")
                .unwrap_or_else(|_| "1.3".to_string())
                .parse()?,
            tts_unlimited_user_ids: parse_uuid_list("TTS_UNLIMITED_USER_IDS"),
            speechify_base_url: env::var("SPEECHIFY_BASE_URL").ok(),
            speechify_api_key: env::var("SPEECHIFY_API_KEY").ok(),
            speechify_default_voice: env::var("SPEECHIFY_DEFAULT_VOICE")
                .unwrap_or_else(|_| "simba".to_string()),
            translate_base_url: env::var("TRANSLATE_BASE_URL").ok(),
            translate_api_key: env::var("TRANSLATE_API_KEY").ok(),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Per-plan limits and defaults, assembled for the pipeline services.
    pub fn plan_policy(&self) -> PlanPolicy {
        PlanPolicy {
            free_max_chars: self.tts_free_max_chars,
            premium_max_chars: self.tts_premium_max_chars,
            free_monthly_cap: self.tts_free_monthly_cap,
            premium_monthly_cap: self.tts_premium_monthly_cap,
            free_daily_cap: self.tts_free_daily_cap,
            premium_daily_cap: self.tts_premium_daily_cap,
            safe_chunk_chars: self.tts_safe_chunk_chars,
            default_voice: self.tts_default_voice.clone(),
            default_engine: self.tts_default_engine,
            concurrent_max_per_user: self.tts_concurrent_max_per_user,
            translate_multiplier: self.tts_translate_multiplier,
            unlimited_user_ids: self.tts_unlimited_user_ids.clone(),
        }
    }
}

/// Caps read `0` or `none` as "no cap".
fn parse_cap(var: &str, default: i64) -> Result<Option<i64>, Box<dyn std::error::Error>> {
    match env::var(var) {
        Err(_) => Ok(Some(default)),
        Ok(raw) => {
            let raw = raw.trim().to_lowercase();
            if raw == "none" || raw == "0" {
                return Ok(None);
            }
            Ok(Some(raw.parse()?))
        }
    }
}

/// Comma-separated UUID allowlist; malformed entries are skipped with a
/// warning rather than failing startup.
fn parse_uuid_list(var: &str) -> Vec<Uuid> {
    let Ok(raw) = env::var(var) else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Uuid::parse_str(s) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(value = s, var = var, "Skipping malformed user id");
                None
            }
        })
        .collect()
}
