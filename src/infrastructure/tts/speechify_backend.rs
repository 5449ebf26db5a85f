use crate::domain::tts::{SynthesisRequest, TtsBackend, TtsError};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Speechify backend; the premium provider.
///
/// Speaks the JSON `/v1/audio/speech` endpoint, which returns base64 audio.
/// Engine and language are intentionally not sent; the provider picks them
/// from the voice.
pub struct SpeechifyTtsBackend {
    base_url: String,
    api_key: String,
    default_voice: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    input: &'a str,
    voice_id: &'a str,
    audio_format: String,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    audio_data: Option<String>,
}

impl SpeechifyTtsBackend {
    pub fn new(
        base_url: &str,
        api_key: String,
        default_voice: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_voice,
            client,
        })
    }

    fn classify_error(err: reqwest::Error) -> TtsError {
        if err.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl TtsBackend for SpeechifyTtsBackend {
    fn name(&self) -> &'static str {
        "speechify"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let voice = if request.voice.trim().is_empty() {
            self.default_voice.as_str()
        } else {
            request.voice.trim()
        };

        let body = SpeechRequest {
            input: &request.text,
            voice_id: voice,
            audio_format: request.format.extension().to_string(),
        };

        let url = format!("{}/v1/audio/speech", self.base_url);
        tracing::debug!(
            voice = voice,
            format = %request.format,
            text_length = request.text.chars().count(),
            "Calling Speechify audio/speech"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::classify_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %message.chars().take(800).collect::<String>(),
                "Speechify synthesis failed"
            );
            return Err(TtsError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let payload: SpeechResponse = response
            .json()
            .await
            .map_err(|e| TtsError::Network(format!("unreadable Speechify response: {e}")))?;

        let encoded = payload.audio_data.unwrap_or_default();
        if encoded.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        let audio = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| TtsError::Network(format!("invalid base64 audio_data: {e}")))?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(audio)
    }
}
