// ABOUTME: Plan command - read-only preview of a store migration
// ABOUTME: Reports rows to re-scope and colliding default-store rows per table

use super::{open_backend, Backend};
use crate::config::MigrationConfig;
use crate::migration::{plan_migration, MigrationPlan, StoreMigrator};
use anyhow::{Context, Result};

/// Preview what `migrate` would change for `source_store_id` without writing
pub async fn plan(
    target_url: &str,
    source_store_id: i64,
    config: &MigrationConfig,
    json: bool,
) -> Result<()> {
    config.validate()?;
    let migrator = StoreMigrator::new(config);
    migrator.check_source_store(source_store_id)?;

    let plan = match open_backend(target_url, &config.table_prefix).await? {
        Backend::Postgres(mut store) => plan_migration(&migrator, &mut store, source_store_id).await,
        Backend::Sqlite(mut store) => plan_migration(&migrator, &mut store, source_store_id).await,
    }
    .context("Failed to plan migration")?;

    if json {
        let out = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{}", out);
    } else {
        log_plan(&plan);
    }
    Ok(())
}

pub(crate) fn log_plan(plan: &MigrationPlan) {
    tracing::info!(
        "Store {} → default store {}:",
        plan.source_store_id,
        plan.default_store_id
    );
    for table in &plan.tables {
        if table.candidates == 0 {
            tracing::debug!("  - {}: nothing to move", table.physical_table);
            continue;
        }
        tracing::info!(
            "  - {}: {} to re-scope, {} colliding default value(s)",
            table.physical_table,
            table.candidates,
            table.collisions
        );
    }
    tracing::info!(
        "Total: {} value(s) to re-scope, {} to delete",
        plan.total_candidates(),
        plan.total_collisions()
    );
}
