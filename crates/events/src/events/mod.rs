use serde::{Deserialize, Serialize};

use patron_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod crawl;
pub mod donation;
pub mod general;
pub mod lock;

pub use crawl::*;
pub use donation::*;
pub use general::*;
pub use lock::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Warnings, failed operations and rate limiting
    General(GeneralEvent),

    /// Organization lock acquisition and release
    Lock(LockEvent),

    /// Repository listing, manifest search and download
    Crawl(CrawlEvent),

    /// Donation processing and ledger writes
    Donation(DonationEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. })
            | Self::Donation(DonationEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. } | GeneralEvent::RateLimitApplied { .. })
            | Self::Lock(LockEvent::Conflict { .. } | LockEvent::ReleaseFailed { .. })
            | Self::Crawl(CrawlEvent::SearchFailed { .. })
            | Self::Donation(
                DonationEvent::SnapshotFailed { .. } | DonationEvent::GroupSkipped { .. },
            ) => Level::WARN,

            Self::Crawl(CrawlEvent::DownloadStarted { .. })
            | Self::Donation(DonationEvent::StageEntered { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "patron::events::general",
            Self::Lock(_) => "patron::events::lock",
            Self::Crawl(_) => "patron::events::crawl",
            Self::Donation(_) => "patron::events::donation",
        }
    }
}
