//! Donation event payloads and ledger records

use serde::{Deserialize, Serialize};

/// 1/1000 of a cent; the smallest currency subunit used for distribution
pub type Millicents = u64;

/// Donation message body as produced by the billing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    /// Gross amount in cents
    pub amount: u64,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Redistribute to this package only instead of the whole organization
    #[serde(default)]
    pub target_package_id: Option<String>,
}

/// A held organization lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub organization_id: String,
    /// Expiry in epoch milliseconds
    pub locked_until: i64,
}

/// One package's share of a group's donation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerShare {
    pub package: String,
    /// Amount in millicents; fractional shares are kept as-is
    pub amount: f64,
}

/// Point-in-time dependency counts for trend reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub organization_id: String,
    /// Transitive dependency count after weight computation
    pub total_deps: u64,
    /// Direct dependency count extracted from manifests
    pub top_level_deps: u64,
    pub timestamp: i64,
}
