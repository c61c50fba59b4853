// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports migrate, plan and tables commands plus backend selection

pub mod migrate;
pub mod plan;
pub mod tables;

pub use migrate::{migrate, MigrateOptions};
pub use plan::plan;
pub use tables::tables;

use crate::postgres::PgStore;
use crate::sqlite::SqliteStore;
use crate::utils::{parse_target, Target};
use anyhow::{Context, Result};

/// Opened backend for a target URL
pub(crate) enum Backend {
    Postgres(PgStore),
    Sqlite(SqliteStore),
}

pub(crate) async fn open_backend(target_url: &str, table_prefix: &str) -> Result<Backend> {
    match parse_target(target_url)? {
        Target::Postgres(url) => {
            tracing::info!("Connecting to PostgreSQL catalog database...");
            let store = PgStore::connect(&url, table_prefix)
                .await
                .context("Failed to connect to target database")?;
            tracing::info!("✓ Connected to target");
            Ok(Backend::Postgres(store))
        }
        Target::Sqlite(path) => {
            tracing::info!("Opening SQLite catalog database '{}'...", path);
            let store = SqliteStore::open(&path, table_prefix)
                .with_context(|| format!("Failed to open SQLite database '{}'", path))?;
            tracing::info!("✓ Opened target");
            Ok(Backend::Sqlite(store))
        }
    }
}
