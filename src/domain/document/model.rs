use crate::domain::plan::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of the audio artifact attached to a document.
///
/// `Processing` is only ever entered from `None` or `Failed`, and resolves to
/// exactly one of `Ready`/`Failed`. At most one job per document is in
/// `Processing` at a time; the stores enforce this with an atomic claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AudioStatus {
    None,
    Processing,
    Ready,
    Failed,
}

impl std::fmt::Display for AudioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioStatus::None => write!(f, "none"),
            AudioStatus::Processing => write!(f, "processing"),
            AudioStatus::Ready => write!(f, "ready"),
            AudioStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub mime: String,
    /// Storage key of the uploaded source file. `None` means nothing was
    /// uploaded yet, which makes the document ineligible for synthesis.
    pub object_key: Option<String>,
    pub plan_at_upload: Plan,
    pub audio_status: AudioStatus,
    pub audio_object_key: Option<String>,
    pub audio_format: Option<String>,
    pub audio_voice: Option<String>,
    pub audio_error: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub fn has_stored_file(&self) -> bool {
        self.object_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
