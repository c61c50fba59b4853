// ABOUTME: Storage backend contract for attribute value tables
// ABOUTME: Defines predicate value objects and the AttributeStore trait

#[cfg(test)]
pub mod memory;
pub mod sql;

#[cfg(test)]
pub use memory::{MemRow, MemoryStore, OpKind, StoreOp};
pub use sql::{Dialect, SqlParam, SqlStatement};

use crate::error::StoreError;
use std::collections::BTreeMap;

/// Physical name of a logical table under `prefix`
pub fn prefixed_table_name(prefix: &str, logical: &str) -> String {
    format!("{}{}", prefix, logical)
}

/// One projected row, values in the order of the requested columns.
pub type Row = Vec<i64>;

/// A single condition on one integer column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column = value`
    Eq { column: String, value: i64 },
    /// `column IN (values...)`; an empty set matches nothing
    In { column: String, values: Vec<i64> },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } | Predicate::In { column, .. } => column,
        }
    }

    fn matches(&self, row: &BTreeMap<String, i64>) -> bool {
        let Some(actual) = row.get(self.column()) else {
            return false;
        };
        match self {
            Predicate::Eq { value, .. } => actual == value,
            Predicate::In { values, .. } => values.contains(actual),
        }
    }
}

/// Conjunction of predicates. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`
    pub fn where_eq(mut self, column: &str, value: i64) -> Self {
        self.predicates.push(Predicate::Eq {
            column: column.to_string(),
            value,
        });
        self
    }

    /// Add `column IN (values)`
    pub fn where_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().collect(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Evaluate the filter against a column-name keyed row
    pub fn matches(&self, row: &BTreeMap<String, i64>) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}

/// `SET column = value` in a bulk update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: String,
    pub value: i64,
}

impl Assignment {
    pub fn new(column: &str, value: i64) -> Self {
        Self {
            column: column.to_string(),
            value,
        }
    }
}

/// Relational store holding the attribute value tables.
///
/// All calls between [`begin`](Self::begin) and [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) run on the same session, so every statement
/// issued in that window belongs to one transaction.
#[allow(async_fn_in_trait)]
pub trait AttributeStore {
    /// Resolve a logical table key to its physical name
    fn table_name(&self, logical: &str) -> String;

    async fn begin(&mut self) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Read `columns` of every row matching `filter`, ordered by the first column
    async fn select_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        filter: &Filter,
    ) -> Result<Vec<Row>, StoreError>;

    /// Delete every row matching `filter`, returning the number removed
    async fn delete_rows(&mut self, table: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Apply `assignments` to every row matching `filter`, returning the number changed
    async fn update_rows(
        &mut self,
        table: &str,
        assignments: &[Assignment],
        filter: &Filter,
    ) -> Result<u64, StoreError>;
}
