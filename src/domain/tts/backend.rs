use super::{SynthesisRequest, TtsError};
use async_trait::async_trait;

/// One external text-to-speech provider.
///
/// Implementations handle provider-specific request shapes and error
/// mapping; they do not split text or merge audio. Every call receives one
/// already-bounded segment.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Synthesize one segment to audio bytes in the requested format.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError>;
}
