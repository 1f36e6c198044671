//! Organization lock errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LockError {
    /// Another worker holds an unexpired lock for the organization.
    #[error("organization {organization_id} is locked by another worker")]
    Conflict { organization_id: String },

    #[error("failed to release lock for {organization_id}: {message}")]
    ReleaseFailed {
        organization_id: String,
        message: String,
    },
}

impl UserFacingError for LockError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Conflict { .. } => {
                Some("The donation is already being processed; the queue will redeliver it.")
            }
            Self::ReleaseFailed { .. } => Some("The lock expires on its own after its TTL."),
        }
    }

    fn is_retryable(&self) -> bool {
        true
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Conflict { .. } => "lock.conflict",
            Self::ReleaseFailed { .. } => "lock.release_failed",
        })
    }
}
