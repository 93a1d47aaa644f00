//! PostgreSQL backend.
//!
//! Every value is sent as text and cast to the declared column type inside
//! the statement, so the loader never has to know PostgreSQL wire types.

use super::{sql, Dialect, StorageError, Store, TableRef};
use crate::domain::Scalar;
use crate::schema::ColumnSpec;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::debug;

/// Connection parameters for [`PgStore::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
}

fn map_err(e: postgres::Error) -> StorageError {
    let lost = e.is_closed()
        || e
            .code()
            .is_some_and(|state| state.code().starts_with("08"));
    if lost {
        StorageError::Connection(e.to_string())
    } else {
        StorageError::Statement(e.to_string())
    }
}

pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn connect(params: &PgParams) -> Result<Self, StorageError> {
        let mut config = postgres::Config::new();
        config
            .host(&params.host)
            .port(params.port)
            .dbname(&params.dbname)
            .user(&params.user);
        if let Some(password) = params.password.as_deref().filter(|p| !p.is_empty()) {
            config.password(password);
        }

        debug!(host = %params.host, port = params.port, dbname = %params.dbname, "connecting to postgres");
        let client = config.connect(NoTls).map_err(|e| {
            StorageError::Connection(format!(
                "{}@{}:{}/{}: {e}",
                params.user, params.host, params.port, params.dbname
            ))
        })?;
        Ok(Self { client })
    }

    fn query_count(&mut self, sql: &str) -> Result<u64, StorageError> {
        let row = self.client.query_one(sql, &[]).map_err(map_err)?;
        let n: i64 = row.try_get(0).map_err(map_err)?;
        Ok(n.max(0) as u64)
    }
}

fn schema_of(table: &TableRef) -> &str {
    table.schema.as_deref().unwrap_or("public")
}

impl Store for PgStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn truncate(&mut self, table: &TableRef) -> Result<(), StorageError> {
        self.client
            .batch_execute(&sql::truncate(Dialect::Postgres, table))
            .map_err(map_err)
    }

    fn insert_rows(
        &mut self,
        table: &TableRef,
        columns: &[&ColumnSpec],
        rows: &[Vec<Scalar>],
    ) -> Result<u64, StorageError> {
        let statement = sql::insert(Dialect::Postgres, table, columns);
        let mut tx = self.client.transaction().map_err(map_err)?;
        let stmt = tx.prepare(&statement).map_err(map_err)?;

        let mut inserted = 0u64;
        for row in rows {
            let values: Vec<Option<String>> = row.iter().map(Scalar::to_text).collect();
            let params: Vec<&(dyn ToSql + Sync)> =
                values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
            inserted += tx.execute(&stmt, &params).map_err(map_err)?;
        }

        tx.commit().map_err(map_err)?;
        Ok(inserted)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), StorageError> {
        let mut tx = self.client.transaction().map_err(map_err)?;
        tx.batch_execute(sql).map_err(map_err)?;
        tx.commit().map_err(map_err)
    }

    fn table_exists(&mut self, table: &TableRef) -> Result<bool, StorageError> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_name = $2)",
                &[&schema_of(table), &table.name],
            )
            .map_err(map_err)?;
        row.try_get(0).map_err(map_err)
    }

    fn column_names(&mut self, table: &TableRef) -> Result<Vec<String>, StorageError> {
        let rows = self
            .client
            .query(
                "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
                &[&schema_of(table), &table.name],
            )
            .map_err(map_err)?;
        rows.iter()
            .map(|r| r.try_get::<_, String>(0).map_err(map_err))
            .collect()
    }

    fn count_rows(&mut self, table: &TableRef) -> Result<u64, StorageError> {
        self.query_count(&sql::count_rows(Dialect::Postgres, table))
    }

    fn count_by(
        &mut self,
        table: &TableRef,
        column: &str,
        limit: u32,
    ) -> Result<Vec<(String, u64)>, StorageError> {
        let rows = self
            .client
            .query(&sql::count_by(Dialect::Postgres, table, column, limit), &[])
            .map_err(map_err)?;
        rows.iter()
            .map(|r| {
                let value: Option<String> = r.try_get(0).map_err(map_err)?;
                let count: i64 = r.try_get(1).map_err(map_err)?;
                Ok((value.unwrap_or_default(), count.max(0) as u64))
            })
            .collect()
    }

    fn count_distinct(&mut self, table: &TableRef, column: &str) -> Result<u64, StorageError> {
        self.query_count(&sql::count_distinct(Dialect::Postgres, table, column))
    }

    fn table_size(&mut self, table: &TableRef) -> Result<String, StorageError> {
        let row = self
            .client
            .query_one(
                "SELECT pg_size_pretty(pg_total_relation_size($1::text::regclass))",
                &[&table.qualified(Dialect::Postgres)],
            )
            .map_err(map_err)?;
        row.try_get(0).map_err(map_err)
    }
}
