//! Package records as stored by the ledger

use serde::{Deserialize, Serialize};

/// A known package.
///
/// Identifying fields are optional because records can be created
/// incompletely by other tooling; the processor refuses to redistribute
/// to a package until they are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub name: Option<String>,
    pub language: Option<String>,
    pub registry: Option<String>,
}

impl PackageRecord {
    /// Names of the identifying fields that are absent or empty
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |field: &Option<String>| field.as_deref().is_none_or(str::is_empty);

        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push("name");
        }
        if blank(&self.language) {
            missing.push("language");
        }
        if blank(&self.registry) {
            missing.push("registry");
        }
        missing
    }
}
