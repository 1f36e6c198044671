//! TTL-based organization lock

use crate::traits::DistributedLock;
use async_trait::async_trait;
use patron_errors::{Error, LockError};
use patron_types::{now_millis, LockRecord};
use sqlx::{query, Pool, Row, Sqlite};
use std::time::Duration;

/// Lock held in the `org_locks` table.
///
/// Acquisition is a single conditional upsert, so two workers racing for
/// the same organization cannot both succeed. An expired row is taken over
/// in place; a crashed holder therefore blocks others for at most one TTL.
#[derive(Clone)]
pub struct OrgLock {
    pool: Pool<Sqlite>,
    ttl: Duration,
}

impl OrgLock {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Acquire as if the current time were `now_ms`
    ///
    /// # Errors
    ///
    /// Returns `LockError::Conflict` if an unexpired lock exists, or a state
    /// error if the database call fails.
    pub async fn acquire_at(&self, organization_id: &str, now_ms: i64) -> Result<LockRecord, Error> {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let locked_until = now_ms.saturating_add(ttl_ms);

        let row = query(
            "INSERT INTO org_locks (organization_id, locked_until) VALUES (?1, ?2)
             ON CONFLICT (organization_id) DO UPDATE SET locked_until = excluded.locked_until
             WHERE org_locks.locked_until < ?3
             RETURNING organization_id, locked_until",
        )
        .bind(organization_id)
        .bind(locked_until)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(LockRecord {
                organization_id: row.get("organization_id"),
                locked_until: row.get("locked_until"),
            }),
            None => Err(LockError::Conflict {
                organization_id: organization_id.to_string(),
            }
            .into()),
        }
    }

    /// Current lock row, expired or not
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current(&self, organization_id: &str) -> Result<Option<LockRecord>, Error> {
        let row = query("SELECT organization_id, locked_until FROM org_locks WHERE organization_id = ?1")
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| LockRecord {
            organization_id: row.get("organization_id"),
            locked_until: row.get("locked_until"),
        }))
    }
}

#[async_trait]
impl DistributedLock for OrgLock {
    async fn acquire(&self, organization_id: &str) -> Result<LockRecord, Error> {
        self.acquire_at(organization_id, now_millis()).await
    }

    async fn release(&self, organization_id: &str) -> Result<(), Error> {
        query("DELETE FROM org_locks WHERE organization_id = ?1")
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(|e| LockError::ReleaseFailed {
                organization_id: organization_id.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
