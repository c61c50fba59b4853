// ABOUTME: Runs the reconciler over every catalog table inside one transaction
// ABOUTME: Commits when all tables succeed, rolls everything back otherwise

use super::reconciler::{TableReconciler, TableReport};
use super::tables::CATALOG_EAV_TABLES;
use crate::config::{FailureMode, MigrationConfig};
use crate::error::{MigrationError, MigrationResult};
use crate::store::AttributeStore;
use serde::Serialize;

/// Per-table results of a committed migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub source_store_id: i64,
    pub default_store_id: i64,
    pub tables: Vec<TableReport>,
}

impl MigrationReport {
    pub fn total_deleted(&self) -> u64 {
        self.tables.iter().map(|t| t.deleted).sum()
    }

    pub fn total_updated(&self) -> u64 {
        self.tables.iter().map(|t| t.updated).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.tables.iter().all(|t| t.candidates == 0)
    }
}

/// Result of [`StoreMigrator::migrate`]
#[derive(Debug)]
pub enum MigrationOutcome {
    /// Rows were moved and the transaction committed
    Migrated(MigrationReport),
    /// No table held rows for the source store
    NoOp,
    /// The batch failed and was rolled back (best-effort mode only)
    RolledBack { cause: MigrationError },
}

/// Collapses one store's catalog attribute values onto the default store.
#[derive(Debug, Clone)]
pub struct StoreMigrator {
    reconciler: TableReconciler,
    failure_mode: FailureMode,
    tables: &'static [&'static str],
}

impl StoreMigrator {
    pub fn new(config: &MigrationConfig) -> Self {
        Self {
            reconciler: TableReconciler::new(config.default_store_id, &config.link_field),
            failure_mode: config.failure_mode,
            tables: &CATALOG_EAV_TABLES,
        }
    }

    pub fn reconciler(&self) -> &TableReconciler {
        &self.reconciler
    }

    pub fn tables(&self) -> &'static [&'static str] {
        self.tables
    }

    /// Reject stores that cannot be collapsed onto the default store
    pub fn check_source_store(&self, source_store_id: i64) -> MigrationResult<()> {
        if source_store_id <= 0 {
            return Err(MigrationError::InvalidStore {
                store_id: source_store_id,
                reason: "store id must be positive".to_string(),
            });
        }
        if source_store_id == self.reconciler.default_store_id() {
            return Err(MigrationError::InvalidStore {
                store_id: source_store_id,
                reason: "source store is the default store".to_string(),
            });
        }
        Ok(())
    }

    pub async fn migrate<S: AttributeStore>(
        &self,
        store: &mut S,
        source_store_id: i64,
    ) -> MigrationResult<MigrationOutcome> {
        self.migrate_with_progress(store, source_store_id, |_| {})
            .await
    }

    /// Migrate every catalog table in one transaction, calling `on_table`
    /// after each table is reconciled.
    ///
    /// In [`FailureMode::Strict`] a failed batch is rolled back and the cause
    /// returned as `Err`. In [`FailureMode::BestEffort`] it is rolled back and
    /// returned as [`MigrationOutcome::RolledBack`]. A failed rollback is
    /// always an `Err`.
    pub async fn migrate_with_progress<S, F>(
        &self,
        store: &mut S,
        source_store_id: i64,
        mut on_table: F,
    ) -> MigrationResult<MigrationOutcome>
    where
        S: AttributeStore,
        F: FnMut(&TableReport),
    {
        self.check_source_store(source_store_id)?;

        tracing::info!(
            "Collapsing store {} onto default store {} ({} tables)...",
            source_store_id,
            self.reconciler.default_store_id(),
            self.tables.len()
        );

        store
            .begin()
            .await
            .map_err(|source| MigrationError::Transaction {
                action: "begin",
                source,
            })?;

        let result = self.reconcile_all(store, source_store_id, &mut on_table).await;

        let report = match result {
            Ok(report) => report,
            Err(cause) => return self.abort(store, cause).await,
        };

        if let Err(source) = store.commit().await {
            let cause = MigrationError::Transaction {
                action: "commit",
                source,
            };
            return self.abort(store, cause).await;
        }

        if report.is_noop() {
            tracing::info!("✓ No rows scoped to store {}; nothing to migrate", source_store_id);
            return Ok(MigrationOutcome::NoOp);
        }

        tracing::info!(
            "✓ Store {} migrated: {} row(s) re-scoped, {} colliding row(s) removed",
            source_store_id,
            report.total_updated(),
            report.total_deleted()
        );
        Ok(MigrationOutcome::Migrated(report))
    }

    async fn reconcile_all<S, F>(
        &self,
        store: &mut S,
        source_store_id: i64,
        on_table: &mut F,
    ) -> MigrationResult<MigrationReport>
    where
        S: AttributeStore,
        F: FnMut(&TableReport),
    {
        let mut tables = Vec::with_capacity(self.tables.len());
        for (idx, table) in self.tables.iter().enumerate() {
            tracing::debug!("Reconciling table {}/{}: {}", idx + 1, self.tables.len(), table);
            let report = self
                .reconciler
                .reconcile(store, table, source_store_id)
                .await?;
            on_table(&report);
            tables.push(report);
        }
        Ok(MigrationReport {
            source_store_id,
            default_store_id: self.reconciler.default_store_id(),
            tables,
        })
    }

    async fn abort<S: AttributeStore>(
        &self,
        store: &mut S,
        cause: MigrationError,
    ) -> MigrationResult<MigrationOutcome> {
        tracing::warn!("⚠ Migration failed, rolling back: {}", cause);

        if let Err(rollback) = store.rollback().await {
            tracing::error!("Rollback failed: {}", rollback);
            return Err(MigrationError::RollbackFailed {
                cause: Box::new(cause),
                rollback,
            });
        }

        match self.failure_mode {
            FailureMode::Strict => Err(cause),
            FailureMode::BestEffort => {
                tracing::warn!("Best-effort mode: batch rolled back, continuing");
                Ok(MigrationOutcome::RolledBack { cause })
            }
        }
    }
}
