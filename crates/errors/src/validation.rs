//! Donation event validation errors
//!
//! These are fatal for the event that produced them: retrying the same
//! payload cannot succeed.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("undefined organization id passed in")]
    MissingOrganizationId,

    #[error("malformed donation payload: {message}")]
    MalformedPayload { message: String },

    #[error("organization not found: {id}")]
    OrganizationNotFound { id: String },

    #[error("target package not found: {id}")]
    PackageNotFound { id: String },

    #[error("target package {id} is missing required fields: {}", .fields.join(", "))]
    PackageMissingFields { id: String, fields: Vec<String> },
}

impl UserFacingError for ValidationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingOrganizationId | Self::MalformedPayload { .. } => {
                Some("Fix the producer of the donation message; it will not succeed on redelivery.")
            }
            Self::PackageMissingFields { .. } => {
                Some("Complete the package record (name, language, registry) before redistributing.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingOrganizationId => "validation.missing_org_id",
            Self::MalformedPayload { .. } => "validation.malformed_payload",
            Self::OrganizationNotFound { .. } => "validation.org_not_found",
            Self::PackageNotFound { .. } => "validation.package_not_found",
            Self::PackageMissingFields { .. } => "validation.package_missing_fields",
        };
        Some(code)
    }
}
