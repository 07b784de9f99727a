use thiserror::Error;

/// Application-wide error types for JobBot.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// The host's robots.txt disallows the target URL for our agent.
    #[error("Disallowed by robots.txt: {0}")]
    PolicyRejected(String),

    /// Non-success HTTP status or unreadable response body.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Response body does not have the shape the strategy expects.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Navigation or DOM evaluation failed in the headless browser.
    #[error("Render error: {0}")]
    RenderError(String),

    /// The target URL cannot be parsed or has no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The caller abandoned the request before it finished.
    #[error("Extraction cancelled")]
    Cancelled,

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Short, stable label for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::PolicyRejected(_) => "policy_rejected",
            AppError::FetchError(_) | AppError::NetworkError(_) | AppError::Timeout(_) => "fetch",
            AppError::ParseError(_) => "parse",
            AppError::RenderError(_) => "render",
            AppError::InvalidUrl(_) => "invalid_url",
            AppError::Cancelled => "cancelled",
            AppError::ConfigError(_) => "config",
        }
    }
}
