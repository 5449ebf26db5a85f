use crate::error::{AppError, AppResult};

/// Text extraction port, routed by MIME type.
///
/// `max_pages <= 0` means all pages for paged formats. Implementations
/// return empty text when nothing is readable and an error for unsupported
/// or corrupt input; they never return partial garbage.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, mime: &str, bytes: &[u8], max_pages: i32) -> AppResult<String>;
}

/// Plain-text extractor. PDF/DOCX/OCR extraction is provided by a separate
/// service behind the same trait.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, mime: &str, bytes: &[u8], _max_pages: i32) -> AppResult<String> {
        let base = mime.split(';').next().unwrap_or(mime).trim();
        if base != "text/plain" && !base.starts_with("text/") {
            return Err(AppError::BadRequest(format!(
                "Unsupported content type for extraction: {mime}"
            )));
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_text() {
        let text = PlainTextExtractor
            .extract("text/plain", b"hello world", 0)
            .unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn accepts_charset_parameter() {
        let text = PlainTextExtractor
            .extract("text/plain; charset=utf-8", b"ok", 0)
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn rejects_unsupported_mime() {
        let err = PlainTextExtractor
            .extract("application/pdf", b"%PDF-1.7", 0)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let text = PlainTextExtractor
            .extract("text/plain", &[0x68, 0x69, 0xFF], 0)
            .unwrap();
        assert!(text.starts_with("hi"));
    }
}
