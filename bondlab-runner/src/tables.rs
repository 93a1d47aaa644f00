//! Destination table administration: list, create, drop, clear, stats.

use crate::config::{AppConfig, ConfigError, TableSpec};
use bondlab_core::domain::RecordKind;
use bondlab_core::storage::{sql, StorageError, Store};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Date columns considered for the "recent entries" statistic, in order.
pub const STATS_DATE_COLUMNS: &[&str] = &["tradedate", "coupondate", "amortdate", "offerdate", "matdate"];
/// Key columns considered for the distinct-count statistic, in order.
pub const STATS_KEY_COLUMNS: &[&str] = &["isin", "secid"];
const RECENT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    List,
    Create,
    Drop,
    Clear,
    Stats,
}

impl FromStr for TableAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" | "list_tables" => Ok(TableAction::List),
            "create" => Ok(TableAction::Create),
            "drop" => Ok(TableAction::Drop),
            "clear" => Ok(TableAction::Clear),
            "stats" => Ok(TableAction::Stats),
            other => Err(format!(
                "unknown table action '{other}'. Valid: list, create, drop, clear, stats"
            )),
        }
    }
}

// ── List ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Exists,
    NotFound,
    CheckFailed(String),
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Exists => write!(f, "EXISTS"),
            TableStatus::NotFound => write!(f, "NOT FOUND"),
            TableStatus::CheckFailed(e) => write!(f, "CHECK FAILED: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableListing {
    pub kind: RecordKind,
    /// Qualified table name, if the kind is validly configured.
    pub table: Option<String>,
    pub status: TableStatus,
}

impl fmt::Display for TableListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<15} -> {:<24} ({})",
            self.kind.to_string(),
            self.table.as_deref().unwrap_or("-"),
            self.status
        )
    }
}

/// Every record kind with its configured table and whether it exists.
pub fn list_tables<S: Store + ?Sized>(config: &AppConfig, store: &mut S) -> Vec<TableListing> {
    RecordKind::ALL
        .iter()
        .map(|&kind| match config.table(kind) {
            Ok(spec) => TableListing {
                kind,
                table: Some(spec.table.to_string()),
                status: match store.table_exists(&spec.table) {
                    Ok(true) => TableStatus::Exists,
                    Ok(false) => TableStatus::NotFound,
                    Err(e) => TableStatus::CheckFailed(e.to_string()),
                },
            },
            Err(e) => TableListing {
                kind,
                table: None,
                status: TableStatus::CheckFailed(e.to_string()),
            },
        })
        .collect()
}

// ── Create / drop / clear ────────────────────────────────────────────

/// DDL for one table: `CREATE TABLE IF NOT EXISTS` plus its indexes.
pub fn create_statements<S: Store + ?Sized>(store: &S, spec: &TableSpec) -> Vec<String> {
    let dialect = store.dialect();
    let mut statements = vec![sql::create_table(dialect, &spec.table, &spec.mapping, &spec.unique_key)];
    statements.extend(
        spec.indexes
            .iter()
            .map(|column| sql::create_index(dialect, &spec.table, column)),
    );
    statements
}

pub fn create_table<S: Store + ?Sized>(store: &mut S, spec: &TableSpec) -> Result<(), StorageError> {
    let batch = create_statements(store, spec).join(";\n");
    store.execute_batch(&batch)?;
    info!(table = %spec.table, indexes = spec.indexes.len(), "table created (or already existed)");
    Ok(())
}

pub fn drop_table<S: Store + ?Sized>(store: &mut S, spec: &TableSpec) -> Result<(), StorageError> {
    let statement = sql::drop_table(store.dialect(), &spec.table);
    store.execute_batch(&statement)?;
    info!(table = %spec.table, "table dropped (if it existed)");
    Ok(())
}

pub fn clear_table<S: Store + ?Sized>(store: &mut S, spec: &TableSpec) -> Result<(), StorageError> {
    store.truncate(&spec.table)?;
    info!(table = %spec.table, "table cleared");
    Ok(())
}

/// Apply a create, drop or clear action to one kind.
pub fn apply<S: Store + ?Sized>(
    config: &AppConfig,
    store: &mut S,
    action: TableAction,
    kind: RecordKind,
) -> Result<(), TableError> {
    let spec = config.table(kind)?;
    match action {
        TableAction::Create => create_table(store, spec)?,
        TableAction::Drop => drop_table(store, spec)?,
        TableAction::Clear => clear_table(store, spec)?,
        TableAction::List | TableAction::Stats => {}
    }
    Ok(())
}

// ── Stats ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub table: String,
    pub rows: Option<u64>,
    /// First of [`STATS_DATE_COLUMNS`] the table has, with its most recent
    /// values and their row counts.
    pub recent: Option<(String, Vec<(String, u64)>)>,
    /// First of [`STATS_KEY_COLUMNS`] the table has, with its distinct count.
    pub distinct: Option<(String, u64)>,
    pub size: Option<String>,
    /// Statistics that could not be gathered.
    pub errors: Vec<String>,
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Statistics for table: {} ---", self.table)?;
        match self.rows {
            Some(rows) => writeln!(f, "  Total rows: {rows}")?,
            None => writeln!(f, "  Total rows: unavailable")?,
        }
        match &self.recent {
            Some((column, values)) => {
                writeln!(f, "  Recent entries by {column}:")?;
                for (value, count) in values {
                    writeln!(f, "    {value}: {count} rows")?;
                }
            }
            None => writeln!(f, "  No standard date column found")?,
        }
        match &self.distinct {
            Some((column, n)) => writeln!(f, "  Distinct {}: {n}", column.to_ascii_uppercase())?,
            None => writeln!(f, "  No standard key column (isin, secid) found")?,
        }
        if let Some(size) = &self.size {
            writeln!(f, "  Table size (approx.): {size}")?;
        }
        for e in &self.errors {
            writeln!(f, "  error: {e}")?;
        }
        Ok(())
    }
}

/// Gather statistics for one table. Individual failures are collected in
/// [`TableStats::errors`] rather than aborting.
pub fn table_stats<S: Store + ?Sized>(store: &mut S, spec: &TableSpec) -> TableStats {
    let table = &spec.table;
    let mut stats = TableStats {
        table: table.to_string(),
        rows: None,
        recent: None,
        distinct: None,
        size: None,
        errors: Vec::new(),
    };

    match store.count_rows(table) {
        Ok(n) => stats.rows = Some(n),
        Err(e) => stats.errors.push(format!("row count: {e}")),
    }

    let columns: Vec<String> = match store.column_names(table) {
        Ok(cols) => cols.into_iter().map(|c| c.to_ascii_lowercase()).collect(),
        Err(e) => {
            stats.errors.push(format!("columns: {e}"));
            Vec::new()
        }
    };
    let first_present = |candidates: &[&str]| {
        candidates
            .iter()
            .find(|c| columns.iter().any(|col| col == *c))
            .map(|c| c.to_string())
    };

    if let Some(column) = first_present(STATS_DATE_COLUMNS) {
        match store.count_by(table, &column, RECENT_LIMIT) {
            Ok(values) => stats.recent = Some((column, values)),
            Err(e) => stats.errors.push(format!("recent {column}: {e}")),
        }
    }
    if let Some(column) = first_present(STATS_KEY_COLUMNS) {
        match store.count_distinct(table, &column) {
            Ok(n) => stats.distinct = Some((column, n)),
            Err(e) => stats.errors.push(format!("distinct {column}: {e}")),
        }
    }

    match store.table_size(table) {
        Ok(size) => stats.size = Some(size),
        Err(StorageError::Unsupported { .. }) => {}
        Err(e) => stats.errors.push(format!("size: {e}")),
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!("list".parse::<TableAction>().unwrap(), TableAction::List);
        assert_eq!("list_tables".parse::<TableAction>().unwrap(), TableAction::List);
        assert_eq!("STATS".parse::<TableAction>().unwrap(), TableAction::Stats);
        assert!("truncate".parse::<TableAction>().is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(TableStatus::Exists.to_string(), "EXISTS");
        assert_eq!(TableStatus::NotFound.to_string(), "NOT FOUND");
    }
}
