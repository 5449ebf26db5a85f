use crate::domain::tts::{SynthesisRequest, TtsBackend, TtsError};
use async_trait::async_trait;

/// Deterministic offline backend for local development and tests: returns
/// the input text tagged with a fixed prefix instead of real audio.
pub struct DevTtsBackend;

#[async_trait]
impl TtsBackend for DevTtsBackend {
    fn name(&self) -> &'static str {
        "dev"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        Ok(format!("DEV_TTS:{}", request.text).into_bytes())
    }
}
