// ABOUTME: Shared fixtures for integration tests
// ABOUTME: Builds a SQLite catalog schema and reads table state back for comparison

#![allow(dead_code)]

use catalog_single_store_migrator::migration::CATALOG_EAV_TABLES;
use catalog_single_store_migrator::sqlite::SqliteStore;
use rusqlite::{params, Connection};

/// (value_id, attribute_id, row_id, store_id)
pub type ValueRow = (i64, i64, i64, i64);

pub fn create_catalog_schema(conn: &Connection, prefix: &str) {
    for table in CATALOG_EAV_TABLES {
        conn.execute_batch(&format!(
            "CREATE TABLE {prefix}{table} (
                value_id INTEGER PRIMARY KEY,
                attribute_id INTEGER NOT NULL,
                store_id INTEGER NOT NULL,
                row_id INTEGER NOT NULL,
                value TEXT,
                UNIQUE (row_id, attribute_id, store_id)
            );"
        ))
        .unwrap();
    }
}

pub fn catalog_store(prefix: &str) -> SqliteStore {
    let store = SqliteStore::in_memory(prefix).unwrap();
    create_catalog_schema(store.connection(), prefix);
    store
}

pub fn insert_value(conn: &Connection, table: &str, row: ValueRow) {
    let (value_id, attribute_id, row_id, store_id) = row;
    conn.execute(
        &format!(
            "INSERT INTO {} (value_id, attribute_id, row_id, store_id, value) VALUES (?1, ?2, ?3, ?4, ?5)",
            table
        ),
        params![value_id, attribute_id, row_id, store_id, format!("v{}", value_id)],
    )
    .unwrap();
}

pub fn rows(conn: &Connection, table: &str) -> Vec<ValueRow> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT value_id, attribute_id, row_id, store_id FROM {} ORDER BY value_id",
            table
        ))
        .unwrap();
    let mapped = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .unwrap();
    mapped.collect::<rusqlite::Result<Vec<ValueRow>>>().unwrap()
}

/// Every catalog table with its rows, in processing order
pub fn snapshot(conn: &Connection, prefix: &str) -> Vec<(String, Vec<ValueRow>)> {
    CATALOG_EAV_TABLES
        .iter()
        .map(|t| {
            let physical = format!("{}{}", prefix, t);
            let data = rows(conn, &physical);
            (physical, data)
        })
        .collect()
}

/// Make every UPDATE on `table` abort
pub fn break_updates(conn: &Connection, table: &str) {
    conn.execute_batch(&format!(
        "CREATE TRIGGER fail_{table} BEFORE UPDATE ON {table}
         BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;"
    ))
    .unwrap();
}
