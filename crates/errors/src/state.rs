//! Persistence error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("database error: {message}")]
    DatabaseError { message: String },

    #[error("transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },

    #[error("corrupted record in {table}: {message}")]
    CorruptedRecord { table: String, message: String },
}
