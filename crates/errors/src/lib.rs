#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for patron
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so results can be fanned out to
//! per-record batch reports.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod crawl;
pub mod lock;
pub mod network;
pub mod resolver;
pub mod state;
pub mod validation;

// Re-export all error types at the root
pub use config::ConfigError;
pub use crawl::CrawlError;
pub use lock::LockError;
pub use network::NetworkError;
pub use resolver::ResolverError;
pub use state::StateError;
pub use validation::ValidationError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

/// Coarse classification used by the batch handler to decide what the
/// queue should redeliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input; redelivery cannot help.
    Validation,
    /// Another worker is processing the same organization.
    LockConflict,
    /// Code host, database or resolver failure.
    Upstream,
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::Config(_) => ErrorClass::Validation,
            Self::Lock(LockError::Conflict { .. }) => ErrorClass::LockConflict,
            _ => ErrorClass::Upstream,
        }
    }

    #[must_use]
    pub fn is_lock_conflict(&self) -> bool {
        self.class() == ErrorClass::LockConflict
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::State(StateError::DatabaseError {
            message: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for patron operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for log output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Validation(err) => err.user_message(),
            Error::Lock(err) => err.user_message(),
            Error::Network(err) => err.user_message(),
            Error::Crawl(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Validation(err) => err.user_hint(),
            Error::Lock(err) => err.user_hint(),
            Error::Network(err) => err.user_hint(),
            Error::Crawl(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Validation(_) | Error::Config(_) | Error::Internal(_) => false,
            Error::Lock(err) => err.is_retryable(),
            Error::Network(err) => err.is_retryable(),
            Error::Crawl(err) => err.is_retryable(),
            Error::Resolver(_) | Error::State(_) | Error::Io { .. } => true,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Validation(err) => err.user_code(),
            Error::Lock(err) => err.user_code(),
            Error::Network(err) => err.user_code(),
            Error::Crawl(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Resolver(_) => Some("error.resolver"),
            Error::State(_) => Some("error.state"),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
