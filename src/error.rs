/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a caller may safely retry the same request later.
    ///
    /// Daily-limit and backpressure rejections clear on their own; validation
    /// and monthly-quota errors do not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_) | Self::ExternalService(_))
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
