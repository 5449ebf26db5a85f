use crate::error::AppResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Translation port. Omitting a translator from the pipeline means
/// pass-through: the extracted text is synthesized as-is.
#[async_trait]
pub trait TranslateService: Send + Sync {
    /// Translate `text` from `source` (or `"auto"`) into `target`.
    async fn translate(&self, text: &str, source: &str, target: &str) -> AppResult<String>;
}

/// Pass-through translator.
pub struct NoopTranslateService;

#[async_trait]
impl TranslateService for NoopTranslateService {
    async fn translate(&self, text: &str, _source: &str, _target: &str) -> AppResult<String> {
        Ok(text.to_string())
    }
}

/// LibreTranslate client over its form-encoded `/translate` endpoint.
///
/// Translation is best-effort: any failure logs a warning and falls back to
/// the untranslated text, so a flaky translator never fails a whole job.
pub struct LibreTranslateService {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl LibreTranslateService {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TranslateService for LibreTranslateService {
    async fn translate(&self, text: &str, source: &str, target: &str) -> AppResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let source = if source.trim().is_empty() { "auto" } else { source };
        let mut form = vec![
            ("q", text.to_string()),
            ("source", source.to_string()),
            ("target", target.to_string()),
            ("format", "text".to_string()),
        ];
        if let Some(api_key) = &self.api_key {
            form.push(("api_key", api_key.clone()));
        }

        let url = format!("{}/translate", self.base_url);
        let response = match self.client.post(&url).form(&form).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "Translate request failed, keeping original text");
                return Ok(text.to_string());
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "Translate failed, keeping original text"
            );
            return Ok(text.to_string());
        }

        match response.json::<TranslateResponse>().await {
            Ok(TranslateResponse {
                translated_text: Some(translated),
            }) => Ok(translated),
            Ok(_) => {
                tracing::warn!("Translate response missing translatedText, keeping original text");
                Ok(text.to_string())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Translate response unreadable, keeping original text");
                Ok(text.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_translator_passes_text_through() {
        let translated = NoopTranslateService
            .translate("bonjour le monde", "auto", "en")
            .await
            .unwrap();
        assert_eq!(translated, "bonjour le monde");
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back_to_original_text() {
        let svc = LibreTranslateService::new(
            "http://127.0.0.1:1", // nothing listens here
            None,
            Duration::from_millis(200),
        )
        .unwrap();
        let translated = svc.translate("hola", "auto", "en").await.unwrap();
        assert_eq!(translated, "hola");
    }
}
