pub mod backend;
pub mod chunker;
pub mod error;
pub mod joiner;
pub mod retry;
pub mod router;
pub mod voices;

pub use backend::TtsBackend;
pub use chunker::{split_by_sentences, TextSegment};
pub use error::TtsError;
pub use joiner::join_mp3;
pub use router::RoutingBackend;
pub use voices::{StaticVoiceCatalog, VoiceCatalog};

use crate::domain::plan::Plan;
use serde::{Deserialize, Serialize};

/// Synthesis engine tier. `Standard` is the baseline every plan can use;
/// `Neural` is gated by plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Standard,
    Neural,
}

impl Engine {
    pub fn parse(s: &str) -> Option<Engine> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(Engine::Standard),
            "neural" => Some(Engine::Neural),
            _ => None,
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Standard => write!(f, "standard"),
            Engine::Neural => write!(f, "neural"),
        }
    }
}

/// Output container requested by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Mp3,
    OggVorbis,
    Pcm,
}

impl AudioFormat {
    /// Lenient parse; anything unrecognized falls back to MP3.
    pub fn parse_or_mp3(s: &str) -> AudioFormat {
        match s.trim().to_lowercase().as_str() {
            "ogg_vorbis" | "ogg" => AudioFormat::OggVorbis,
            "pcm" => AudioFormat::Pcm,
            _ => AudioFormat::Mp3,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::OggVorbis => "ogg",
            AudioFormat::Pcm => "pcm",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::OggVorbis => "audio/ogg",
            AudioFormat::Pcm => "audio/wave",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFormat::Mp3 => write!(f, "mp3"),
            AudioFormat::OggVorbis => write!(f, "ogg_vorbis"),
            AudioFormat::Pcm => write!(f, "pcm"),
        }
    }
}

/// One backend call's worth of input. Created per segment, discarded after
/// the call returns.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub plan: Plan,
    pub text: String,
    pub voice: String,
    pub engine: Engine,
    pub format: AudioFormat,
    pub language: Option<String>,
}
