use crate::error::AppError;

/// Failures coming back from a synthesis backend.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("provider returned empty audio")]
    EmptyAudio,
}

impl TtsError {
    /// Transient failures are worth retrying: throttling (429), server-side
    /// errors (5xx), timeouts and network-level failures. Any other 4xx means
    /// the request itself is bad and retrying cannot help.
    pub fn is_transient(&self) -> bool {
        match self {
            TtsError::Provider { status, .. } => *status == 429 || (500..600).contains(status),
            TtsError::Network(_) | TtsError::Timeout => true,
            TtsError::EmptyAudio => false,
        }
    }
}

impl From<TtsError> for AppError {
    fn from(err: TtsError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_server_errors_are_transient() {
        let e = TtsError::Provider {
            status: 429,
            message: "slow down".into(),
        };
        assert!(e.is_transient());
        let e = TtsError::Provider {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(e.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let e = TtsError::Provider {
            status: 400,
            message: "bad voice".into(),
        };
        assert!(!e.is_transient());
        assert!(!TtsError::EmptyAudio.is_transient());
    }

    #[test]
    fn network_failures_and_timeouts_are_transient() {
        assert!(TtsError::Network("connection reset".into()).is_transient());
        assert!(TtsError::Timeout.is_transient());
    }
}
