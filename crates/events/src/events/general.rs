use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Cross-cutting events not tied to one processing domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    Warning {
        message: String,
        context: Option<String>,
    },

    /// An operation failed before its domain could report it
    OperationFailed {
        operation: String,
        failure: FailureContext,
    },

    /// Requests are held back until the upstream rate limit resets
    RateLimitApplied {
        operation: String,
        delay_ms: u64,
        reason: String,
    },
}

impl GeneralEvent {
    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }
}
