//! SQLite backend.
//!
//! Values are bound with their native SQLite storage class. SQLite ignores
//! schema qualification, so any configured schema is dropped.

use super::{sql, Dialect, StorageError, Store, TableRef};
use crate::domain::Scalar;
use crate::schema::ColumnSpec;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode};
use std::path::Path;

impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Null => ToSqlOutput::Owned(Value::Null),
            Scalar::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            Scalar::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Scalar::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Scalar::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn map_err(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::SystemIoFailure
            ) =>
        {
            StorageError::Connection(e.to_string())
        }
        _ => StorageError::Statement(e.to_string()),
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| StorageError::Connection(format!("{}: {e}", path.display())))?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Raw connection, for ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_count(&self, sql: &str) -> Result<u64, StorageError> {
        let n: i64 = self.conn.query_row(sql, [], |r| r.get(0)).map_err(map_err)?;
        Ok(n.max(0) as u64)
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn truncate(&mut self, table: &TableRef) -> Result<(), StorageError> {
        self.conn
            .execute(&sql::truncate(Dialect::Sqlite, table), [])
            .map_err(map_err)?;
        Ok(())
    }

    fn insert_rows(
        &mut self,
        table: &TableRef,
        columns: &[&ColumnSpec],
        rows: &[Vec<Scalar>],
    ) -> Result<u64, StorageError> {
        let statement = sql::insert(Dialect::Sqlite, table, columns);
        let tx = self.conn.transaction().map_err(map_err)?;
        let mut inserted = 0u64;
        {
            let mut stmt = tx.prepare(&statement).map_err(map_err)?;
            for row in rows {
                inserted += stmt.execute(params_from_iter(row.iter())).map_err(map_err)? as u64;
            }
        }
        tx.commit().map_err(map_err)?;
        Ok(inserted)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), StorageError> {
        let tx = self.conn.transaction().map_err(map_err)?;
        tx.execute_batch(sql).map_err(map_err)?;
        tx.commit().map_err(map_err)
    }

    fn table_exists(&mut self, table: &TableRef) -> Result<bool, StorageError> {
        let n: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&table.name],
                |r| r.get(0),
            )
            .map_err(map_err)?;
        Ok(n > 0)
    }

    fn column_names(&mut self, table: &TableRef) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(map_err)?;
        let names = stmt
            .query_map([&table.name], |r| r.get::<_, String>(0))
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        Ok(names)
    }

    fn count_rows(&mut self, table: &TableRef) -> Result<u64, StorageError> {
        self.query_count(&sql::count_rows(Dialect::Sqlite, table))
    }

    fn count_by(
        &mut self,
        table: &TableRef,
        column: &str,
        limit: u32,
    ) -> Result<Vec<(String, u64)>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&sql::count_by(Dialect::Sqlite, table, column, limit))
            .map_err(map_err)?;
        let rows = stmt
            .query_map([], |r| {
                let value: Option<String> = r.get(0)?;
                let count: i64 = r.get(1)?;
                Ok((value.unwrap_or_default(), count.max(0) as u64))
            })
            .map_err(map_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_err)?;
        Ok(rows)
    }

    fn count_distinct(&mut self, table: &TableRef, column: &str) -> Result<u64, StorageError> {
        self.query_count(&sql::count_distinct(Dialect::Sqlite, table, column))
    }

    fn table_size(&mut self, _table: &TableRef) -> Result<String, StorageError> {
        Err(StorageError::Unsupported {
            what: "table size",
            dialect: Dialect::Sqlite,
        })
    }
}
