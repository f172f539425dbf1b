//! Error types for the dashboard presentation layer

/// Errors that can occur while fetching or rendering dashboard data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Missing CSRF token")]
    MissingCsrfToken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for presentation-layer operations
pub type Result<T> = std::result::Result<T, AppError>;
