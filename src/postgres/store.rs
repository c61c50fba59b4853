// ABOUTME: AttributeStore backed by a single PostgreSQL session
// ABOUTME: Issues BEGIN/COMMIT/ROLLBACK on the same client as the bulk statements

use super::connection::connect_with_retry;
use crate::error::StoreError;
use crate::store::{
    prefixed_table_name, Assignment, AttributeStore, Dialect, Filter, Row, SqlParam, SqlStatement,
};
use anyhow::Result;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;

pub struct PgStore {
    client: Client,
    table_prefix: String,
    in_transaction: bool,
}

fn bind(params: &[SqlParam]) -> Vec<Box<dyn ToSql + Sync>> {
    params
        .iter()
        .map(|param| -> Box<dyn ToSql + Sync> {
            match param {
                SqlParam::Int(v) => Box::new(*v),
                SqlParam::IntArray(values) => Box::new(values.clone()),
            }
        })
        .collect()
}

impl PgStore {
    pub fn new(client: Client, table_prefix: &str) -> Self {
        Self {
            client,
            table_prefix: table_prefix.to_string(),
            in_transaction: false,
        }
    }

    /// Connect (with retry) and wrap the session
    pub async fn connect(connection_string: &str, table_prefix: &str) -> Result<Self> {
        let client = connect_with_retry(connection_string).await?;
        Ok(Self::new(client, table_prefix))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn execute(&self, stmt: &SqlStatement) -> Result<u64, StoreError> {
        tracing::debug!("{}", stmt.sql);
        let params = bind(&stmt.params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        Ok(self.client.execute(stmt.sql.as_str(), &refs).await?)
    }
}

impl AttributeStore for PgStore {
    fn table_name(&self, logical: &str) -> String {
        prefixed_table_name(&self.table_prefix, logical)
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::TransactionState(
                "transaction already open".to_string(),
            ));
        }
        self.client.batch_execute("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::TransactionState(
                "commit without open transaction".to_string(),
            ));
        }
        // Stays open on failure so the caller can still issue ROLLBACK
        self.client.batch_execute("COMMIT").await?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::TransactionState(
                "rollback without open transaction".to_string(),
            ));
        }
        self.in_transaction = false;
        self.client.batch_execute("ROLLBACK").await?;
        Ok(())
    }

    async fn select_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        filter: &Filter,
    ) -> Result<Vec<Row>, StoreError> {
        let stmt = Dialect::Postgres.select(table, columns, filter)?;
        tracing::debug!("{}", stmt.sql);
        let params = bind(&stmt.params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();

        let rows = self.client.query(stmt.sql.as_str(), &refs).await?;
        rows.iter()
            .map(|row| {
                (0..columns.len())
                    .map(|idx| row.try_get::<_, i64>(idx).map_err(StoreError::from))
                    .collect::<Result<Row, StoreError>>()
            })
            .collect()
    }

    async fn delete_rows(&mut self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        let stmt = Dialect::Postgres.delete(table, filter);
        self.execute(&stmt).await
    }

    async fn update_rows(
        &mut self,
        table: &str,
        assignments: &[Assignment],
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let stmt = Dialect::Postgres.update(table, assignments, filter)?;
        self.execute(&stmt).await
    }
}
