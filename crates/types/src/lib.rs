#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for patron
//!
//! This crate provides the data model shared by the crawler, the
//! persistence layer and the donation processor.

pub mod donation;
pub mod manifest;
pub mod organization;
pub mod package;
pub mod weights;

// Re-export commonly used types
pub use donation::{DonationRecord, LedgerShare, LockRecord, Millicents, UsageSnapshot};
pub use manifest::{DependencyGroup, ManifestRecord, SearchPattern};
pub use organization::Organization;
pub use package::PackageRecord;
pub use weights::PackageWeightMap;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(registry, language)` pair that scopes manifests, dependency lists
/// and weight maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ecosystem {
    pub registry: String,
    pub language: String,
}

impl Ecosystem {
    pub fn new(registry: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            language: language.into(),
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.language, self.registry)
    }
}

/// Current wall-clock time in epoch milliseconds
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
