//! Opening the configured store.

use crate::config::{Backend, DatabaseConfig};
use bondlab_core::storage::{PgParams, PgStore, SqliteStore, StorageError, Store};
use tracing::info;

/// Connect to the configured database. The returned store holds the only
/// connection for the whole invocation.
pub fn open_store(db: &DatabaseConfig) -> Result<Box<dyn Store>, StorageError> {
    match db.backend {
        Backend::Postgres => {
            let store = PgStore::connect(&PgParams {
                host: db.host.clone(),
                port: db.port,
                dbname: db.database.clone(),
                user: db.user.clone(),
                password: db.password.clone(),
            })?;
            info!(host = %db.host, database = %db.database, "connected to postgres");
            Ok(Box::new(store))
        }
        Backend::Sqlite => {
            let path = db
                .path
                .as_deref()
                .ok_or_else(|| StorageError::Connection("database.path is not set".into()))?;
            let store = SqliteStore::open(path)?;
            info!(path = %path.display(), "opened sqlite database");
            Ok(Box::new(store))
        }
    }
}
