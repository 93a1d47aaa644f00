//! Relational destination stores.
//!
//! The [`Store`] trait is everything the loader, the orchestrator and the
//! table administration need from a database connection. Two backends
//! implement it:
//!
//! - [`PgStore`]: PostgreSQL through the synchronous `postgres` client
//! - [`SqliteStore`]: SQLite through `rusqlite`, used for local runs and tests
//!
//! A store owns exactly one connection; dropping the store closes it.

pub mod pg;
pub mod sql;
pub mod sqlite;

pub use self::pg::{PgParams, PgStore};
pub use self::sqlite::SqliteStore;

use crate::domain::Scalar;
use crate::schema::ColumnSpec;
use std::fmt;
use thiserror::Error;

/// SQL flavour spoken by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Storage failures, split by how far they reach.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The connection is unusable. Nothing further can be written.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// A single statement or transaction failed and was rolled back.
    #[error("statement failed: {0}")]
    Statement(String),

    #[error("{what} is not supported by the {dialect} backend")]
    Unsupported { what: &'static str, dialect: Dialect },
}

impl StorageError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

/// A destination table, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.filter(|s| !s.trim().is_empty()).map(str::to_string),
            name: name.into(),
        }
    }

    /// Quoted name as used in statements. SQLite has no schemas, so the
    /// schema part is dropped there.
    pub fn qualified(&self, dialect: Dialect) -> String {
        match (&self.schema, dialect) {
            (Some(schema), Dialect::Postgres) => {
                format!("{}.{}", sql::quote_ident(schema), sql::quote_ident(&self.name))
            }
            _ => sql::quote_ident(&self.name),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One database connection able to hold the ingested data.
pub trait Store {
    fn dialect(&self) -> Dialect;

    /// Remove every row of `table`.
    fn truncate(&mut self, table: &TableRef) -> Result<(), StorageError>;

    /// Insert `rows` into `columns` of `table` in a single transaction,
    /// skipping rows that conflict with an existing unique key. Returns the
    /// number of rows actually inserted. On error nothing is committed.
    fn insert_rows(
        &mut self,
        table: &TableRef,
        columns: &[&ColumnSpec],
        rows: &[Vec<Scalar>],
    ) -> Result<u64, StorageError>;

    /// Run semicolon-separated statements in one transaction.
    fn execute_batch(&mut self, sql: &str) -> Result<(), StorageError>;

    fn table_exists(&mut self, table: &TableRef) -> Result<bool, StorageError>;

    /// Column names of an existing table in declaration order.
    fn column_names(&mut self, table: &TableRef) -> Result<Vec<String>, StorageError>;

    fn count_rows(&mut self, table: &TableRef) -> Result<u64, StorageError>;

    /// The `limit` highest non-null values of `column` with their row counts,
    /// descending.
    fn count_by(
        &mut self,
        table: &TableRef,
        column: &str,
        limit: u32,
    ) -> Result<Vec<(String, u64)>, StorageError>;

    fn count_distinct(&mut self, table: &TableRef, column: &str) -> Result<u64, StorageError>;

    /// Human-readable on-disk size. Backends that cannot report it return
    /// [`StorageError::Unsupported`].
    fn table_size(&mut self, table: &TableRef) -> Result<String, StorageError>;
}

impl<T: Store + ?Sized> Store for Box<T> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn truncate(&mut self, table: &TableRef) -> Result<(), StorageError> {
        (**self).truncate(table)
    }

    fn insert_rows(
        &mut self,
        table: &TableRef,
        columns: &[&ColumnSpec],
        rows: &[Vec<Scalar>],
    ) -> Result<u64, StorageError> {
        (**self).insert_rows(table, columns, rows)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), StorageError> {
        (**self).execute_batch(sql)
    }

    fn table_exists(&mut self, table: &TableRef) -> Result<bool, StorageError> {
        (**self).table_exists(table)
    }

    fn column_names(&mut self, table: &TableRef) -> Result<Vec<String>, StorageError> {
        (**self).column_names(table)
    }

    fn count_rows(&mut self, table: &TableRef) -> Result<u64, StorageError> {
        (**self).count_rows(table)
    }

    fn count_by(
        &mut self,
        table: &TableRef,
        column: &str,
        limit: u32,
    ) -> Result<Vec<(String, u64)>, StorageError> {
        (**self).count_by(table, column, limit)
    }

    fn count_distinct(&mut self, table: &TableRef, column: &str) -> Result<u64, StorageError> {
        (**self).count_distinct(table, column)
    }

    fn table_size(&mut self, table: &TableRef) -> Result<String, StorageError> {
        (**self).table_size(table)
    }
}
