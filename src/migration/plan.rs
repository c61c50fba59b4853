// ABOUTME: Read-only dry run of a store migration
// ABOUTME: Counts rows to re-scope and colliding default-store rows per table

use super::orchestrator::StoreMigrator;
use crate::error::MigrationResult;
use crate::store::AttributeStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePlan {
    pub table: String,
    pub physical_table: String,
    /// Rows currently scoped to the source store
    pub candidates: usize,
    /// Default-store rows the delete step would remove
    pub collisions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub source_store_id: i64,
    pub default_store_id: i64,
    pub tables: Vec<TablePlan>,
}

impl MigrationPlan {
    pub fn total_candidates(&self) -> usize {
        self.tables.iter().map(|t| t.candidates).sum()
    }

    pub fn total_collisions(&self) -> usize {
        self.tables.iter().map(|t| t.collisions).sum()
    }
}

/// Inspect every catalog table without writing anything
pub async fn plan_migration<S: AttributeStore>(
    migrator: &StoreMigrator,
    store: &mut S,
    source_store_id: i64,
) -> MigrationResult<MigrationPlan> {
    migrator.check_source_store(source_store_id)?;
    let reconciler = migrator.reconciler();

    let mut tables = Vec::with_capacity(migrator.tables().len());
    for table in migrator.tables() {
        let candidates = reconciler
            .fetch_candidates(store, table, source_store_id)
            .await?;
        let collisions = reconciler
            .count_collisions(store, table, &candidates)
            .await?;
        tables.push(TablePlan {
            table: table.to_string(),
            physical_table: store.table_name(table),
            candidates: candidates.len(),
            collisions,
        });
    }

    Ok(MigrationPlan {
        source_store_id,
        default_store_id: reconciler.default_store_id(),
        tables,
    })
}
