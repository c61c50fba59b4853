// ABOUTME: Per-table reconciliation of store-scoped attribute values
// ABOUTME: Deletes colliding default-store rows, then re-scopes source-store rows

use super::tables::{ATTRIBUTE_ID_COLUMN, STORE_ID_COLUMN, VALUE_ID_COLUMN};
use crate::error::{MigrationError, MigrationResult, StoreError};
use crate::store::{Assignment, AttributeStore, Filter};
use serde::Serialize;
use std::collections::BTreeSet;

/// Identifying fields of a row scoped to the source store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRow {
    pub value_id: i64,
    pub attribute_id: i64,
    /// Entity link (`row_id` or `entity_id`, depending on the catalog edition)
    pub link_id: i64,
}

/// Outcome of reconciling one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub candidates: usize,
    pub deleted: u64,
    pub updated: u64,
}

impl TableReport {
    fn empty(table: &str) -> Self {
        Self {
            table: table.to_string(),
            candidates: 0,
            deleted: 0,
            updated: 0,
        }
    }
}

/// Collapses the rows of one source store onto the default store, one table at a time.
#[derive(Debug, Clone)]
pub struct TableReconciler {
    default_store_id: i64,
    link_field: String,
}

fn could_not_persist(table: &str) -> impl FnOnce(StoreError) -> MigrationError + '_ {
    move |source| MigrationError::CouldNotPersist {
        table: table.to_string(),
        source,
    }
}

impl TableReconciler {
    pub fn new(default_store_id: i64, link_field: &str) -> Self {
        Self {
            default_store_id,
            link_field: link_field.to_string(),
        }
    }

    pub fn default_store_id(&self) -> i64 {
        self.default_store_id
    }

    /// Read every row of `table` scoped to `source_store_id`, ordered by value id
    pub async fn fetch_candidates<S: AttributeStore>(
        &self,
        store: &mut S,
        table: &str,
        source_store_id: i64,
    ) -> MigrationResult<Vec<CandidateRow>> {
        let physical = store.table_name(table);
        let filter = Filter::new().where_eq(STORE_ID_COLUMN, source_store_id);
        let rows = store
            .select_rows(
                &physical,
                &[VALUE_ID_COLUMN, ATTRIBUTE_ID_COLUMN, self.link_field.as_str()],
                &filter,
            )
            .await
            .map_err(could_not_persist(table))?;

        rows.into_iter()
            .map(|row| match row.as_slice() {
                [value_id, attribute_id, link_id] => Ok(CandidateRow {
                    value_id: *value_id,
                    attribute_id: *attribute_id,
                    link_id: *link_id,
                }),
                other => Err(could_not_persist(table)(StoreError::Backend(format!(
                    "expected 3 columns from '{}', got {}",
                    physical,
                    other.len()
                )))),
            })
            .collect()
    }

    /// Default-store rows sharing an attribute and an entity with the candidates
    fn collision_filter(&self, candidates: &[CandidateRow]) -> Filter {
        let attribute_ids: BTreeSet<i64> = candidates.iter().map(|c| c.attribute_id).collect();
        let link_ids: BTreeSet<i64> = candidates.iter().map(|c| c.link_id).collect();

        Filter::new()
            .where_eq(STORE_ID_COLUMN, self.default_store_id)
            .where_in(ATTRIBUTE_ID_COLUMN, attribute_ids)
            .where_in(&self.link_field, link_ids)
    }

    /// Count default-store rows the delete step would remove, without writing
    pub async fn count_collisions<S: AttributeStore>(
        &self,
        store: &mut S,
        table: &str,
        candidates: &[CandidateRow],
    ) -> MigrationResult<usize> {
        if candidates.is_empty() {
            return Ok(0);
        }
        let physical = store.table_name(table);
        let rows = store
            .select_rows(
                &physical,
                &[VALUE_ID_COLUMN],
                &self.collision_filter(candidates),
            )
            .await
            .map_err(could_not_persist(table))?;
        Ok(rows.len())
    }

    /// Move every `source_store_id` row of `table` onto the default store.
    ///
    /// Default-store rows that collide on (attribute, entity) are deleted first;
    /// the matching set is the cross product of candidate attributes and entities.
    /// The delete always runs before the update.
    pub async fn reconcile<S: AttributeStore>(
        &self,
        store: &mut S,
        table: &str,
        source_store_id: i64,
    ) -> MigrationResult<TableReport> {
        let candidates = self
            .fetch_candidates(store, table, source_store_id)
            .await?;
        if candidates.is_empty() {
            tracing::debug!("No rows for store {} in {}", source_store_id, table);
            return Ok(TableReport::empty(table));
        }

        let physical = store.table_name(table);
        let value_ids: BTreeSet<i64> = candidates.iter().map(|c| c.value_id).collect();

        let deleted = store
            .delete_rows(&physical, &self.collision_filter(&candidates))
            .await
            .map_err(could_not_persist(table))?;

        let updated = store
            .update_rows(
                &physical,
                &[Assignment::new(STORE_ID_COLUMN, self.default_store_id)],
                &Filter::new().where_in(VALUE_ID_COLUMN, value_ids),
            )
            .await
            .map_err(could_not_persist(table))?;

        tracing::debug!(
            "{}: {} candidate(s), {} default row(s) deleted, {} row(s) re-scoped",
            physical,
            candidates.len(),
            deleted,
            updated
        );

        Ok(TableReport {
            table: table.to_string(),
            candidates: candidates.len(),
            deleted,
            updated,
        })
    }
}
