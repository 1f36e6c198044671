//! Database row models

use patron_errors::{Error, StateError};
use patron_types::UsageSnapshot;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A donation ledger row joined with its package identity
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub package_id: String,
    pub package_name: Option<String>,
    pub registry: Option<String>,
    pub language: Option<String>,
    pub organization_id: String,
    /// Millicents
    pub amount: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SnapshotRow {
    pub organization_id: String,
    pub total_deps: i64,
    pub top_level_deps: i64,
    pub timestamp: i64,
}

impl SnapshotRow {
    pub(crate) fn into_snapshot(self) -> Result<UsageSnapshot, Error> {
        let count = |value: i64, field: &str| {
            u64::try_from(value).map_err(|_| StateError::CorruptedRecord {
                table: "org_snapshots".into(),
                message: format!("negative {field}: {value}"),
            })
        };
        Ok(UsageSnapshot {
            total_deps: count(self.total_deps, "total_deps")?,
            top_level_deps: count(self.top_level_deps, "top_level_deps")?,
            organization_id: self.organization_id,
            timestamp: self.timestamp,
        })
    }
}
