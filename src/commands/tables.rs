// ABOUTME: Tables command - list the catalog tables a migration touches
// ABOUTME: Prints logical and prefixed physical names in processing order

use crate::config::MigrationConfig;
use crate::migration::CATALOG_EAV_TABLES;
use crate::store::prefixed_table_name;
use anyhow::Result;

pub fn tables(config: &MigrationConfig) -> Result<()> {
    config.validate()?;
    for (idx, table) in CATALOG_EAV_TABLES.iter().enumerate() {
        let physical = prefixed_table_name(&config.table_prefix, table);
        if physical == *table {
            println!("{:>2}. {}", idx + 1, table);
        } else {
            println!("{:>2}. {} ({})", idx + 1, table, physical);
        }
    }
    Ok(())
}
