use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Organization lock lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LockEvent {
    Acquired {
        organization_id: String,
        locked_until: i64,
    },

    /// Another worker holds the lock; the event is abandoned
    Conflict { organization_id: String },

    Released { organization_id: String },

    /// Release failed; the lock lingers until its TTL runs out
    ReleaseFailed {
        organization_id: String,
        failure: FailureContext,
    },
}
