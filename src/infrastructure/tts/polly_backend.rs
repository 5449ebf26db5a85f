use crate::domain::tts::{AudioFormat, Engine, SynthesisRequest, TtsBackend, TtsError};
use async_trait::async_trait;
use aws_sdk_polly::error::SdkError;
use aws_sdk_polly::types::{Engine as PollyEngine, OutputFormat, VoiceId};
use aws_sdk_polly::Client as PollyClient;
use std::sync::Arc;

/// Build a Polly client from the ambient AWS credential chain.
pub async fn polly_client_from_env(region: &str) -> PollyClient {
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await;
    PollyClient::new(&aws_config)
}

/// AWS Polly backend; the baseline provider every plan can reach.
pub struct PollyTtsBackend {
    polly_client: Arc<PollyClient>,
}

impl PollyTtsBackend {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    fn engine_of(engine: Engine) -> PollyEngine {
        match engine {
            Engine::Standard => PollyEngine::Standard,
            Engine::Neural => PollyEngine::Neural,
        }
    }

    fn output_format_of(format: AudioFormat) -> OutputFormat {
        match format {
            AudioFormat::Mp3 => OutputFormat::Mp3,
            AudioFormat::OggVorbis => OutputFormat::OggVorbis,
            AudioFormat::Pcm => OutputFormat::Pcm,
        }
    }

    fn classify_error<E>(err: &SdkError<E>) -> TtsError
    where
        E: std::fmt::Debug,
    {
        match err {
            SdkError::ServiceError(ctx) => TtsError::Provider {
                status: ctx.raw().status().as_u16(),
                message: format!("{:?}", ctx.err()),
            },
            SdkError::TimeoutError(_) => TtsError::Timeout,
            SdkError::DispatchFailure(dispatch) => TtsError::Network(format!("{dispatch:?}")),
            other => TtsError::Network(format!("{other:?}")),
        }
    }
}

#[async_trait]
impl TtsBackend for PollyTtsBackend {
    fn name(&self) -> &'static str {
        "polly"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        tracing::debug!(
            voice = %request.voice,
            engine = %request.engine,
            format = %request.format,
            text_length = request.text.chars().count(),
            "Calling Polly synthesize_speech"
        );

        let output = self
            .polly_client
            .synthesize_speech()
            .text(&request.text)
            .voice_id(VoiceId::from(request.voice.as_str()))
            .output_format(Self::output_format_of(request.format))
            .engine(Self::engine_of(request.engine))
            .send()
            .await
            .map_err(|err| {
                let classified = Self::classify_error(&err);
                tracing::error!(
                    error = ?err,
                    voice = %request.voice,
                    engine = %request.engine,
                    "Polly synthesize_speech failed"
                );
                classified
            })?;

        let audio = output
            .audio_stream
            .collect()
            .await
            .map_err(|err| TtsError::Network(format!("failed to read audio stream: {err}")))?
            .into_bytes()
            .to_vec();

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        tracing::debug!(audio_size = audio.len(), "Polly audio stream collected");
        Ok(audio)
    }
}
