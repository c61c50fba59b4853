// ABOUTME: AttributeStore backed by an embedded SQLite database
// ABOUTME: Used for local catalogs, fixtures and transaction tests without a server

use crate::error::StoreError;
use crate::store::{
    prefixed_table_name, Assignment, AttributeStore, Dialect, Filter, Row, SqlParam, SqlStatement,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

pub struct SqliteStore {
    conn: Connection,
    table_prefix: String,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, table_prefix: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn, table_prefix))
    }

    pub fn in_memory(table_prefix: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, table_prefix))
    }

    pub fn from_connection(conn: Connection, table_prefix: &str) -> Self {
        Self {
            conn,
            table_prefix: table_prefix.to_string(),
        }
    }

    /// Underlying connection, for schema setup and inspection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn execute(&self, stmt: &SqlStatement) -> Result<u64, StoreError> {
        tracing::debug!("{}", stmt.sql);
        let changed = self
            .conn
            .execute(&stmt.sql, params_from_iter(bind(stmt)?))?;
        Ok(changed as u64)
    }
}

/// Integer sets travel as a single JSON array text, unpacked by `json_each`
fn bind(stmt: &SqlStatement) -> Result<Vec<Value>, StoreError> {
    stmt.params
        .iter()
        .map(|param| match param {
            SqlParam::Int(v) => Ok(Value::Integer(*v)),
            SqlParam::IntArray(values) => serde_json::to_string(values)
                .map(Value::Text)
                .map_err(|e| StoreError::Backend(format!("Failed to encode id set: {}", e))),
        })
        .collect()
}

impl AttributeStore for SqliteStore {
    fn table_name(&self, logical: &str) -> String {
        prefixed_table_name(&self.table_prefix, logical)
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        if !self.conn.is_autocommit() {
            return Err(StoreError::TransactionState(
                "transaction already open".to_string(),
            ));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            return Err(StoreError::TransactionState(
                "commit without open transaction".to_string(),
            ));
        }
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            return Err(StoreError::TransactionState(
                "rollback without open transaction".to_string(),
            ));
        }
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    async fn select_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        filter: &Filter,
    ) -> Result<Vec<Row>, StoreError> {
        let stmt = Dialect::Sqlite.select(table, columns, filter)?;
        tracing::debug!("{}", stmt.sql);

        let mut prepared = self.conn.prepare(&stmt.sql)?;
        let rows = prepared.query_map(params_from_iter(bind(&stmt)?), |row| {
            (0..columns.len())
                .map(|idx| row.get::<_, i64>(idx))
                .collect::<rusqlite::Result<Row>>()
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<Row>>>()?)
    }

    async fn delete_rows(&mut self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        let stmt = Dialect::Sqlite.delete(table, filter);
        self.execute(&stmt)
    }

    async fn update_rows(
        &mut self,
        table: &str,
        assignments: &[Assignment],
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let stmt = Dialect::Sqlite.update(table, assignments, filter)?;
        self.execute(&stmt)
    }
}
