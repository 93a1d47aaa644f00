//! Collector configuration.
//!
//! One TOML file describes the API, the database and, per record kind, the
//! destination table and its columns. An optional secrets file is merged
//! over it key by key before parsing, so credentials can live apart from
//! the versioned configuration:
//!
//! ```toml
//! [database]
//! password = "s3cret"
//! ```
//!
//! Problems with the file itself, the `[api]` section or the `[database]`
//! section fail the whole load. Problems with one `[tables.<kind>]` entry
//! only disable that kind: they are reported by [`AppConfig::table`] when the
//! kind is actually used.

use bondlab_core::domain::RecordKind;
use bondlab_core::schema::{ColumnSpec, ConfigurationError, SchemaMapping};
use bondlab_core::storage::TableRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "bondlab.toml";
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";
/// Upper bound for `api.max_retries`.
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("invalid TOML in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no table configured for '{kind}'")]
    MissingTable { kind: RecordKind },

    #[error("table for '{kind}' has no name")]
    BlankTableName { kind: RecordKind },

    #[error("table for '{kind}' has no unique_key; re-runs would duplicate rows")]
    MissingUniqueKey { kind: RecordKind },

    #[error("{what} column '{column}' of '{kind}' is not declared in its columns")]
    UnknownKeyColumn {
        kind: RecordKind,
        column: String,
        what: &'static str,
    },

    #[error(transparent)]
    Mapping(#[from] ConfigurationError),
}

// ── File format ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Page size sent as `limit` on paginated endpoints.
    pub default_limit: u64,
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://iss.moex.com/iss".into(),
            default_limit: 100,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Schema qualifying every table (PostgreSQL only).
    pub schema: String,
    /// Database file (SQLite only).
    pub path: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Postgres,
            host: "localhost".into(),
            port: 5432,
            database: "moex".into(),
            user: "postgres".into(),
            password: None,
            schema: "public".into(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub unique_key: Vec<String>,
    /// Columns to index. When absent, the well-known key and date columns
    /// present in `columns` are indexed.
    #[serde(default)]
    pub indexes: Option<Vec<String>>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api: ApiConfig,
    #[serde(default)]
    database: DatabaseConfig,
    #[serde(default)]
    tables: BTreeMap<String, TableConfig>,
}

// ── Validated configuration ──────────────────────────────────────────

/// Columns indexed by default when a table declares them.
pub const WELL_KNOWN_INDEX_COLUMNS: &[&str] =
    &["secid", "isin", "tradedate", "coupondate", "amortdate", "offerdate"];

/// A validated destination table for one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub kind: RecordKind,
    pub table: TableRef,
    pub mapping: SchemaMapping,
    pub unique_key: Vec<String>,
    pub indexes: Vec<String>,
}

impl TableSpec {
    fn build(kind: RecordKind, raw: TableConfig, schema: &str) -> Result<Self, ConfigError> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(ConfigError::BlankTableName { kind });
        }
        let mapping = SchemaMapping::new(kind.key(), raw.columns)?;
        if raw.unique_key.is_empty() {
            return Err(ConfigError::MissingUniqueKey { kind });
        }

        for column in &raw.unique_key {
            if !mapping.has_column(column) {
                return Err(ConfigError::UnknownKeyColumn {
                    kind,
                    column: column.clone(),
                    what: "unique key",
                });
            }
        }

        let indexes = match raw.indexes {
            Some(indexes) => {
                if let Some(column) = indexes.iter().find(|c| !mapping.has_column(c)) {
                    return Err(ConfigError::UnknownKeyColumn {
                        kind,
                        column: column.clone(),
                        what: "index",
                    });
                }
                indexes
            }
            None => WELL_KNOWN_INDEX_COLUMNS
                .iter()
                .filter(|c| mapping.has_column(c))
                .map(|c| c.to_string())
                .collect(),
        };

        Ok(Self {
            kind,
            table: TableRef::new(Some(schema), name),
            mapping,
            unique_key: raw.unique_key,
            indexes,
        })
    }
}

/// Fully loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    tables: BTreeMap<RecordKind, Result<TableSpec, ConfigError>>,
}

impl AppConfig {
    /// Read the main file and, if it exists, the secrets file.
    pub fn load(main: &Path, secrets: Option<&Path>) -> Result<Self, ConfigError> {
        let main_text = read(main)?;
        info!(path = %main.display(), "loaded configuration");

        let secrets_text = match secrets {
            Some(path) if path.exists() => {
                let text = read(path)?;
                info!(path = %path.display(), "loaded secrets");
                Some(text)
            }
            Some(path) => {
                warn!(path = %path.display(), "secrets file not found, continuing without it");
                None
            }
            None => None,
        };

        Self::from_toml(&main_text, secrets_text.as_deref())
    }

    /// Parse configuration text, merging `secrets` over `main`.
    pub fn from_toml(main: &str, secrets: Option<&str>) -> Result<Self, ConfigError> {
        let mut merged = parse_table(main, "configuration")?;
        if let Some(secrets) = secrets {
            merge(&mut merged, parse_table(secrets, "secrets")?);
        }

        let file: ConfigFile = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                origin: "configuration".into(),
                message: e.to_string(),
            })?;

        validate_api(&file.api)?;
        validate_database(&file.database)?;

        let mut tables = BTreeMap::new();
        for (key, raw) in file.tables {
            let kind = match key.parse::<RecordKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(table = %key, "ignoring table section: {e}");
                    continue;
                }
            };
            if tables.contains_key(&kind) {
                return Err(ConfigError::Invalid(format!(
                    "table '{kind}' is configured more than once (as '{key}')"
                )));
            }
            tables.insert(kind, TableSpec::build(kind, raw, &file.database.schema));
        }

        Ok(Self {
            api: file.api,
            database: file.database,
            tables,
        })
    }

    /// The validated table for `kind`, or why it cannot be used.
    pub fn table(&self, kind: RecordKind) -> Result<&TableSpec, ConfigError> {
        match self.tables.get(&kind) {
            Some(Ok(spec)) => Ok(spec),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ConfigError::MissingTable { kind }),
        }
    }

    /// Per-kind validation failures, for reporting at startup.
    pub fn table_errors(&self) -> impl Iterator<Item = (RecordKind, &ConfigError)> {
        self.tables
            .iter()
            .filter_map(|(kind, r)| r.as_ref().err().map(|e| (*kind, e)))
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_table(text: &str, origin: &str) -> Result<toml::Table, ConfigError> {
    text.parse::<toml::Table>().map_err(|e| ConfigError::Parse {
        origin: origin.into(),
        message: e.to_string(),
    })
}

/// Recursive merge: tables merge key by key, any other overlay value replaces
/// the base value.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(b)), toml::Value::Table(o)) => merge(b, o),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    if api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url is empty".into()));
    }
    if api.default_limit == 0 {
        return Err(ConfigError::Invalid("api.default_limit must be positive".into()));
    }
    if api.timeout_secs == 0 {
        return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
    }
    if api.max_retries > MAX_RETRIES {
        return Err(ConfigError::Invalid(format!(
            "api.max_retries must be at most {MAX_RETRIES}"
        )));
    }
    Ok(())
}

fn validate_database(db: &DatabaseConfig) -> Result<(), ConfigError> {
    match db.backend {
        Backend::Postgres => {
            if db.host.trim().is_empty() || db.database.trim().is_empty() || db.user.trim().is_empty()
            {
                return Err(ConfigError::Invalid(
                    "database.host, database.database and database.user are required for postgres"
                        .into(),
                ));
            }
        }
        Backend::Sqlite => {
            if db.path.as_ref().map_or(true, |p| p.as_os_str().is_empty()) {
                return Err(ConfigError::Invalid("database.path is required for sqlite".into()));
            }
        }
    }
    Ok(())
}
