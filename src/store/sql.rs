// ABOUTME: Renders predicate value objects into parameterized SQL statements
// ABOUTME: Shared by the PostgreSQL and SQLite backends, one dialect each

use super::{Assignment, Filter, Predicate};
use crate::error::StoreError;

/// Placeholder and casting conventions of a SQL backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `$n` placeholders, integer sets bound as one `bigint[]` parameter
    Postgres,
    /// `?n` placeholders, integer sets bound as one JSON array read through `json_each`
    Sqlite,
}

/// Bound parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    IntArray(Vec<i64>),
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Quote an identifier, doubling any embedded quote characters
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

struct Builder {
    dialect: Dialect,
    params: Vec<SqlParam>,
    next: usize,
}

impl Builder {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
            next: 1,
        }
    }

    fn scalar(&mut self, value: i64) -> String {
        let n = self.next;
        self.next += 1;
        self.params.push(SqlParam::Int(value));
        match self.dialect {
            Dialect::Postgres => format!("${}::bigint", n),
            Dialect::Sqlite => format!("?{}", n),
        }
    }

    fn predicate(&mut self, predicate: &Predicate) -> String {
        let column = quote_ident(predicate.column());
        match predicate {
            Predicate::Eq { value, .. } => format!("{} = {}", column, self.scalar(*value)),
            Predicate::In { values, .. } => match self.dialect {
                Dialect::Postgres => {
                    let n = self.next;
                    self.next += 1;
                    self.params.push(SqlParam::IntArray(values.clone()));
                    format!("{} = ANY(${}::bigint[])", column, n)
                }
                Dialect::Sqlite if values.is_empty() => "0 = 1".to_string(),
                Dialect::Sqlite => {
                    let n = self.next;
                    self.next += 1;
                    self.params.push(SqlParam::IntArray(values.clone()));
                    format!("{} IN (SELECT value FROM json_each(?{}))", column, n)
                }
            },
        }
    }

    fn where_clause(&mut self, filter: &Filter) -> String {
        if filter.predicates().is_empty() {
            return String::new();
        }
        let conditions: Vec<String> = filter
            .predicates()
            .iter()
            .map(|p| self.predicate(p))
            .collect();
        format!(" WHERE {}", conditions.join(" AND "))
    }

    fn finish(self, sql: String) -> SqlStatement {
        SqlStatement {
            sql,
            params: self.params,
        }
    }
}

impl Dialect {
    fn column_expr(&self, column: &str) -> String {
        match self {
            // Catalog id columns are usually int4; read them back as int8
            Dialect::Postgres => format!("{}::bigint", quote_ident(column)),
            Dialect::Sqlite => quote_ident(column),
        }
    }

    pub fn select(
        &self,
        table: &str,
        columns: &[&str],
        filter: &Filter,
    ) -> Result<SqlStatement, StoreError> {
        let Some(first) = columns.first() else {
            return Err(StoreError::Backend(format!(
                "select from '{}' requested no columns",
                table
            )));
        };
        let mut builder = Builder::new(*self);
        let projection: Vec<String> = columns.iter().map(|c| self.column_expr(c)).collect();
        let where_clause = builder.where_clause(filter);
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {}",
            projection.join(", "),
            quote_ident(table),
            where_clause,
            quote_ident(first)
        );
        Ok(builder.finish(sql))
    }

    pub fn delete(&self, table: &str, filter: &Filter) -> SqlStatement {
        let mut builder = Builder::new(*self);
        let where_clause = builder.where_clause(filter);
        let sql = format!("DELETE FROM {}{}", quote_ident(table), where_clause);
        builder.finish(sql)
    }

    pub fn update(
        &self,
        table: &str,
        assignments: &[Assignment],
        filter: &Filter,
    ) -> Result<SqlStatement, StoreError> {
        if assignments.is_empty() {
            return Err(StoreError::Backend(format!(
                "update of '{}' has no assignments",
                table
            )));
        }
        let mut builder = Builder::new(*self);
        let sets: Vec<String> = assignments
            .iter()
            .map(|a| format!("{} = {}", quote_ident(&a.column), builder.scalar(a.value)))
            .collect();
        let where_clause = builder.where_clause(filter);
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_ident(table),
            sets.join(", "),
            where_clause
        );
        Ok(builder.finish(sql))
    }
}
