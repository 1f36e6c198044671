//! SQLite-backed organization store and donation ledger

use crate::models::{LedgerEntry, SnapshotRow};
use crate::traits::{LedgerStore, OrgStore};
use async_trait::async_trait;
use patron_errors::{Error, StateError};
use patron_types::{LedgerShare, Organization, PackageRecord, UsageSnapshot};
use sqlx::{query, query_as, Pool, Row, Sqlite, Transaction};
use std::collections::BTreeSet;

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Insert or replace an organization
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn put_org(&self, org: &Organization) -> Result<(), Error> {
        query(
            "INSERT INTO organizations (id, name, installation_id, host) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name,
                 installation_id = excluded.installation_id,
                 host = excluded.host",
        )
        .bind(&org.id)
        .bind(&org.name)
        .bind(&org.installation_id)
        .bind(&org.host)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the no-compensation list for one ecosystem
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub async fn set_no_comp_list<I, S>(
        &self,
        language: &str,
        registry: &str,
        packages: I,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tx = self.pool.begin().await?;
        query("DELETE FROM no_comp_entries WHERE language = ?1 AND registry = ?2")
            .bind(language)
            .bind(registry)
            .execute(&mut *tx)
            .await?;
        for package in packages {
            query("INSERT OR IGNORE INTO no_comp_entries (language, registry, package) VALUES (?1, ?2, ?3)")
                .bind(language)
                .bind(registry)
                .bind(package.as_ref())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Store a package record as-is, including incomplete ones
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn put_package(&self, package: &PackageRecord) -> Result<(), Error> {
        query(
            "INSERT INTO packages (id, name, language, registry, created_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name,
                 language = excluded.language,
                 registry = excluded.registry",
        )
        .bind(&package.id)
        .bind(&package.name)
        .bind(&package.language)
        .bind(&package.registry)
        .bind(patron_types::now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a package by its identity
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_package(
        &self,
        registry: &str,
        language: &str,
        name: &str,
    ) -> Result<Option<PackageRecord>, Error> {
        let row = query(
            "SELECT id, name, language, registry FROM packages
             WHERE registry = ?1 AND language = ?2 AND name = ?3",
        )
        .bind(registry)
        .bind(language)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| package_from_row(&row)))
    }

    /// Ledger rows for one organization, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn ledger_for_org(&self, organization_id: &str) -> Result<Vec<LedgerEntry>, Error> {
        let rows = query_as::<_, LedgerEntry>(
            "SELECT r.id, r.package_id, p.name AS package_name, p.registry, p.language,
                    r.organization_id, r.amount, r.timestamp
             FROM donation_revenue r JOIN packages p ON p.id = r.package_id
             WHERE r.organization_id = ?1
             ORDER BY r.id",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Usage snapshots for one organization, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored count is negative.
    pub async fn snapshots_for_org(&self, organization_id: &str) -> Result<Vec<UsageSnapshot>, Error> {
        let rows = query_as::<_, SnapshotRow>(
            "SELECT organization_id, total_deps, top_level_deps, timestamp
             FROM org_snapshots WHERE organization_id = ?1 ORDER BY timestamp, id",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SnapshotRow::into_snapshot).collect()
    }
}

fn package_from_row(row: &sqlx::sqlite::SqliteRow) -> PackageRecord {
    PackageRecord {
        id: row.get("id"),
        name: row.get("name"),
        language: row.get("language"),
        registry: row.get("registry"),
    }
}

async fn upsert_package_id(
    tx: &mut Transaction<'_, Sqlite>,
    registry: &str,
    language: &str,
    name: &str,
) -> Result<String, Error> {
    let row = query(
        "INSERT INTO packages (id, name, language, registry, created_at) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (registry, language, name) DO UPDATE SET name = excluded.name
         RETURNING id",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(name)
    .bind(language)
    .bind(registry)
    .bind(patron_types::now_millis())
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.get("id"))
}

#[async_trait]
impl OrgStore for SqliteStore {
    async fn get_org(&self, organization_id: &str) -> Result<Option<Organization>, Error> {
        let row = query("SELECT id, name, installation_id, host FROM organizations WHERE id = ?1")
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Organization {
            id: row.get("id"),
            name: row.get("name"),
            installation_id: row.get("installation_id"),
            host: row.get("host"),
        }))
    }

    async fn get_no_comp_list(
        &self,
        language: &str,
        registry: &str,
    ) -> Result<BTreeSet<String>, Error> {
        let rows = query("SELECT package FROM no_comp_entries WHERE language = ?1 AND registry = ?2")
            .bind(language)
            .bind(registry)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("package")).collect())
    }

    async fn get_package(&self, package_id: &str) -> Result<Option<PackageRecord>, Error> {
        let row = query("SELECT id, name, language, registry FROM packages WHERE id = ?1")
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| package_from_row(&row)))
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn record_group(
        &self,
        organization_id: &str,
        registry: &str,
        language: &str,
        shares: &[LedgerShare],
        timestamp: i64,
    ) -> Result<(), Error> {
        if shares.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for share in shares {
            let package_id = upsert_package_id(&mut tx, registry, language, &share.package).await?;
            query(
                "INSERT INTO donation_revenue (package_id, organization_id, amount, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&package_id)
            .bind(organization_id)
            .bind(share.amount)
            .bind(timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await.map_err(|e| StateError::TransactionFailed {
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn record_snapshot(&self, snapshot: &UsageSnapshot) -> Result<(), Error> {
        let total = i64::try_from(snapshot.total_deps).map_err(|_| StateError::CorruptedRecord {
            table: "org_snapshots".into(),
            message: "total_deps out of range".into(),
        })?;
        let top_level =
            i64::try_from(snapshot.top_level_deps).map_err(|_| StateError::CorruptedRecord {
                table: "org_snapshots".into(),
                message: "top_level_deps out of range".into(),
            })?;

        query(
            "INSERT INTO org_snapshots (organization_id, total_deps, top_level_deps, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&snapshot.organization_id)
        .bind(total)
        .bind(top_level)
        .bind(snapshot.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
