//! Storage seams consumed by the donation processor

use async_trait::async_trait;
use patron_errors::Error;
use patron_types::{LedgerShare, LockRecord, Organization, PackageRecord, UsageSnapshot};
use std::collections::BTreeSet;

/// Cross-worker mutual exclusion per organization
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Take the lock, failing with `LockError::Conflict` if it is held and
    /// unexpired.
    async fn acquire(&self, organization_id: &str) -> Result<LockRecord, Error>;

    /// Drop the lock. Releasing a lock that is not held succeeds.
    async fn release(&self, organization_id: &str) -> Result<(), Error>;
}

/// Read-only view of organizations, packages and exclusion lists
#[async_trait]
pub trait OrgStore: Send + Sync {
    async fn get_org(&self, organization_id: &str) -> Result<Option<Organization>, Error>;

    async fn get_no_comp_list(&self, language: &str, registry: &str)
        -> Result<BTreeSet<String>, Error>;

    async fn get_package(&self, package_id: &str) -> Result<Option<PackageRecord>, Error>;
}

/// Append-only donation ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Record every share of one `(registry, language)` group atomically,
    /// creating packages that are not yet known.
    async fn record_group(
        &self,
        organization_id: &str,
        registry: &str,
        language: &str,
        shares: &[LedgerShare],
        timestamp: i64,
    ) -> Result<(), Error>;

    async fn record_snapshot(&self, snapshot: &UsageSnapshot) -> Result<(), Error>;
}
