//! Manifest crawl error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CrawlError {
    #[error("failed to obtain code host credentials for {organization}: {message}")]
    CredentialsUnavailable {
        organization: String,
        message: String,
    },

    #[error("failed to list repositories for {organization}: {message}")]
    RepositoryListingFailed {
        organization: String,
        message: String,
    },

    #[error("failed to download {path} from {repository}: {message}")]
    DownloadFailed {
        repository: String,
        path: String,
        message: String,
    },

    #[error("failed to decode {path} from {repository}: {message}")]
    DecodeFailed {
        repository: String,
        path: String,
        message: String,
    },

    #[error("download pool closed")]
    PoolClosed,
}

impl UserFacingError for CrawlError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CredentialsUnavailable { .. } => {
                Some("Check that the code host installation is still authorized.")
            }
            Self::DownloadFailed { .. } | Self::RepositoryListingFailed { .. } => {
                Some("The whole crawl is retried on redelivery.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        !matches!(self, Self::DecodeFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::CredentialsUnavailable { .. } => "crawl.credentials_unavailable",
            Self::RepositoryListingFailed { .. } => "crawl.repository_listing_failed",
            Self::DownloadFailed { .. } => "crawl.download_failed",
            Self::DecodeFailed { .. } => "crawl.decode_failed",
            Self::PoolClosed => "crawl.pool_closed",
        })
    }
}
