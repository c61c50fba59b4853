// ABOUTME: Single-store migration of catalog attribute values
// ABOUTME: Table list, per-table reconciler, transactional orchestrator and dry-run plan

pub mod orchestrator;
pub mod plan;
pub mod reconciler;
pub mod tables;

pub use orchestrator::{MigrationOutcome, MigrationReport, StoreMigrator};
pub use plan::{plan_migration, MigrationPlan, TablePlan};
pub use reconciler::{CandidateRow, TableReconciler, TableReport};
pub use tables::CATALOG_EAV_TABLES;
