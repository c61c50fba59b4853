// ABOUTME: Error types for storage backends and the store migration
// ABOUTME: Wraps backend faults into a single "could not persist" kind per table

use thiserror::Error;

/// Faults raised by an [`AttributeStore`](crate::store::AttributeStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// PostgreSQL driver error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQLite driver error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Commit or rollback issued without an open transaction, or a nested begin
    #[error("Transaction state error: {0}")]
    TransactionState(String),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

/// Errors surfaced by the reconciler and the migration orchestrator.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// A fetch, delete or update against one table failed
    #[error("Could not persist migration of table '{table}': {source}")]
    CouldNotPersist {
        table: String,
        #[source]
        source: StoreError,
    },

    /// Opening or committing the batch transaction failed
    #[error("Failed to {action} migration transaction: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// The batch failed and the rollback failed as well
    #[error("Migration failed ({cause}) and rollback failed: {rollback}")]
    RollbackFailed {
        cause: Box<MigrationError>,
        rollback: StoreError,
    },

    /// Source store cannot be collapsed onto the default store
    #[error("Invalid source store {store_id}: {reason}")]
    InvalidStore { store_id: i64, reason: String },
}

/// Result type for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;
