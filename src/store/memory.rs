// ABOUTME: In-memory AttributeStore used to exercise the reconciler without a database
// ABOUTME: Records every operation, supports failure injection and write-history capture

use super::{prefixed_table_name, Assignment, AttributeStore, Filter, Row};
use crate::error::StoreError;
use std::collections::BTreeMap;

/// A stored row keyed by column name
pub type MemRow = BTreeMap<String, i64>;

/// Operation observed by the store, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Begin,
    Commit,
    Rollback,
    Select { table: String },
    Delete { table: String, removed: u64 },
    Update { table: String, changed: u64 },
}

impl StoreOp {
    pub fn is_write(&self) -> bool {
        matches!(self, StoreOp::Delete { .. } | StoreOp::Update { .. })
    }
}

/// Kinds of operation a failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Begin,
    Commit,
    Rollback,
    Select,
    Delete,
    Update,
}

#[derive(Debug, Clone)]
struct FailPoint {
    kind: OpKind,
    table: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    prefix: String,
    tables: BTreeMap<String, Vec<MemRow>>,
    snapshot: Option<BTreeMap<String, Vec<MemRow>>>,
    ops: Vec<StoreOp>,
    fail_points: Vec<FailPoint>,
    history: Option<Vec<(String, Vec<MemRow>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose physical table names carry `prefix`
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    pub fn create_table(&mut self, table: &str) {
        self.tables.entry(table.to_string()).or_default();
    }

    /// Insert a row into `table`, creating the table if needed
    pub fn insert(&mut self, table: &str, columns: &[(&str, i64)]) {
        let row = columns.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    /// Current rows of `table`, empty if the table does not exist
    pub fn rows(&self, table: &str) -> Vec<MemRow> {
        self.tables.get(table).cloned().unwrap_or_default()
    }

    /// Full copy of every table, for before/after comparisons
    pub fn dump(&self) -> BTreeMap<String, Vec<MemRow>> {
        self.tables.clone()
    }

    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn write_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_write()).count()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Make every operation of `kind` fail
    pub fn fail_on(&mut self, kind: OpKind) {
        self.fail_points.push(FailPoint { kind, table: None });
    }

    /// Make operations of `kind` against `table` fail
    pub fn fail_on_table(&mut self, kind: OpKind, table: &str) {
        self.fail_points.push(FailPoint {
            kind,
            table: Some(table.to_string()),
        });
    }

    /// Start capturing the state of a table after each delete or update
    pub fn record_history(&mut self) {
        self.history = Some(Vec::new());
    }

    pub fn history(&self) -> &[(String, Vec<MemRow>)] {
        self.history.as_deref().unwrap_or(&[])
    }

    fn check_fail(&self, kind: OpKind, table: Option<&str>) -> Result<(), StoreError> {
        let hit = self.fail_points.iter().any(|fp| {
            fp.kind == kind
                && match (&fp.table, table) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                }
        });
        if hit {
            return Err(StoreError::Backend(format!(
                "injected {:?} failure{}",
                kind,
                table.map(|t| format!(" on '{}'", t)).unwrap_or_default()
            )));
        }
        Ok(())
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut Vec<MemRow>, StoreError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| StoreError::Backend(format!("no such table: {}", table)))
    }

    fn capture(&mut self, table: &str) {
        let rows = self.rows(table);
        if let Some(history) = self.history.as_mut() {
            history.push((table.to_string(), rows));
        }
    }
}

impl AttributeStore for MemoryStore {
    fn table_name(&self, logical: &str) -> String {
        prefixed_table_name(&self.prefix, logical)
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.check_fail(OpKind::Begin, None)?;
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionState(
                "transaction already open".to_string(),
            ));
        }
        self.snapshot = Some(self.tables.clone());
        self.ops.push(StoreOp::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.check_fail(OpKind::Commit, None)?;
        if self.snapshot.take().is_none() {
            return Err(StoreError::TransactionState(
                "commit without open transaction".to_string(),
            ));
        }
        self.ops.push(StoreOp::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.check_fail(OpKind::Rollback, None)?;
        let Some(snapshot) = self.snapshot.take() else {
            return Err(StoreError::TransactionState(
                "rollback without open transaction".to_string(),
            ));
        };
        self.tables = snapshot;
        self.ops.push(StoreOp::Rollback);
        Ok(())
    }

    async fn select_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        filter: &Filter,
    ) -> Result<Vec<Row>, StoreError> {
        self.check_fail(OpKind::Select, Some(table))?;
        let rows = self.table_mut(table)?;

        let mut selected = Vec::new();
        for row in rows.iter().filter(|r| filter.matches(r)) {
            let mut projected = Vec::with_capacity(columns.len());
            for column in columns {
                let value = row.get(*column).ok_or_else(|| {
                    StoreError::Backend(format!("unknown column '{}' in '{}'", column, table))
                })?;
                projected.push(*value);
            }
            selected.push(projected);
        }
        selected.sort_by_key(|r| r.first().copied());

        self.ops.push(StoreOp::Select {
            table: table.to_string(),
        });
        Ok(selected)
    }

    async fn delete_rows(&mut self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.check_fail(OpKind::Delete, Some(table))?;
        let rows = self.table_mut(table)?;

        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        let removed = (before - rows.len()) as u64;

        self.ops.push(StoreOp::Delete {
            table: table.to_string(),
            removed,
        });
        self.capture(table);
        Ok(removed)
    }

    async fn update_rows(
        &mut self,
        table: &str,
        assignments: &[Assignment],
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        self.check_fail(OpKind::Update, Some(table))?;
        let rows = self.table_mut(table)?;

        let mut changed = 0;
        for row in rows.iter_mut().filter(|r| filter.matches(r)) {
            for assignment in assignments {
                row.insert(assignment.column.clone(), assignment.value);
            }
            changed += 1;
        }

        self.ops.push(StoreOp::Update {
            table: table.to_string(),
            changed,
        });
        self.capture(table);
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let mut store = MemoryStore::new();
        store.insert("t", &[("value_id", 1), ("store_id", 2)]);

        store.begin().await.unwrap();
        store
            .delete_rows("t", &Filter::new().where_eq("value_id", 1))
            .await
            .unwrap();
        assert!(store.rows("t").is_empty());

        store.rollback().await.unwrap();
        assert_eq!(store.rows("t").len(), 1);
        assert!(!store.in_transaction());
    }

    #[tokio::test]
    async fn test_commit_without_begin_fails() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.commit().await,
            Err(StoreError::TransactionState(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_is_scoped_to_table() {
        let mut store = MemoryStore::new();
        store.create_table("a");
        store.create_table("b");
        store.fail_on_table(OpKind::Select, "b");

        assert!(store.select_rows("a", &["value_id"], &Filter::new()).await.is_ok());
        assert!(store.select_rows("b", &["value_id"], &Filter::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_select_orders_by_first_column() {
        let mut store = MemoryStore::new();
        store.insert("t", &[("value_id", 9), ("store_id", 1)]);
        store.insert("t", &[("value_id", 3), ("store_id", 1)]);

        let rows = store
            .select_rows("t", &["value_id"], &Filter::new())
            .await
            .unwrap();
        assert_eq!(rows, vec![vec![3], vec![9]]);
    }

    #[tokio::test]
    async fn test_unknown_table_errors() {
        let mut store = MemoryStore::new();
        match store.delete_rows("missing", &Filter::new()).await {
            Err(StoreError::Backend(msg)) => assert_eq!(msg, "no such table: missing"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
