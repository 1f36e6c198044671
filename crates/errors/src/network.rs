//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("invalid response body from {url}: {message}")]
    InvalidBody { url: String, message: String },

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },

    /// The rate limit resets later than the client is willing to wait.
    #[error("rate limit resets in {wait_secs} seconds, longer than the {max_secs} second maximum wait")]
    RateLimitWaitExceeded { wait_secs: u64, max_secs: u64 },
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check connectivity to the code host or resolver service.")
            }
            Self::RateLimited { .. } => Some("Wait for the rate-limit window to reset."),
            Self::RateLimitWaitExceeded { .. } => {
                Some("The event is redelivered; raise code_host.max_rate_limit_wait to wait longer.")
            }
            Self::InvalidUrl(_) => Some("Fix the base URL in the configuration file."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_) | Self::InvalidBody { .. } => false,
            _ => true,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Timeout { .. } => "network.timeout",
            Self::RequestFailed(_) => "network.request_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::HttpError { .. } => "network.http_error",
            Self::InvalidBody { .. } => "network.invalid_body",
            Self::RateLimited { .. } => "network.rate_limited",
            Self::RateLimitWaitExceeded { .. } => "network.rate_limit_wait_exceeded",
        };
        Some(code)
    }
}
