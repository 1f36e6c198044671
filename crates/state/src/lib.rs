#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! State management for patron
//!
//! This crate owns the `SQLite` database shared by all workers: the
//! organization lock table, organizations and their exclusion lists, the
//! package catalogue, the append-only donation ledger and usage snapshots.

pub mod locks;
pub mod models;
pub mod store;
pub mod traits;

pub use locks::OrgLock;
pub use models::LedgerEntry;
pub use store::SqliteStore;
pub use traits::{DistributedLock, LedgerStore, OrgStore};

use patron_errors::Error;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

/// Create a new `SQLite` connection pool
///
/// # Errors
///
/// Returns an error if the database connection fails or configuration is invalid.
pub async fn create_pool(db_path: &Path) -> Result<Pool<Sqlite>, Error> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| {
            Error::from(patron_errors::StateError::DatabaseError {
                message: e.to_string(),
            })
        })?;

    if let Ok(mut conn) = pool.acquire().await {
        let _ = sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&mut *conn)
            .await;
        let _ = sqlx::query("PRAGMA temp_store = MEMORY")
            .execute(&mut *conn)
            .await;
    }

    Ok(pool)
}

/// Run database migrations
///
/// # Errors
///
/// Returns an error if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        patron_errors::StateError::MigrationFailed {
            message: e.to_string(),
        }
        .into()
    })
}

/// Open the database at `db_path` and bring its schema up to date
///
/// # Errors
///
/// Returns an error if the pool cannot be created or a migration fails.
pub async fn open(db_path: &Path) -> Result<Pool<Sqlite>, Error> {
    let pool = create_pool(db_path).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
