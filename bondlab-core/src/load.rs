//! Row projection and idempotent page loading.

use crate::domain::Page;
use crate::schema::{resolve, ConfigurationError, SchemaMapping};
use crate::storage::{StorageError, Store, TableRef};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LoadError {
    /// Whether the store can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::Storage(e) if e.is_fatal())
    }
}

/// What happened to one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows were written; `inserted` excludes duplicates that were skipped.
    Loaded { received: usize, inserted: u64 },
    /// None of the page's columns is declared in the mapping.
    NoMatchingColumns { received: usize },
    /// The page had no rows.
    Empty,
}

impl LoadOutcome {
    pub fn received(&self) -> usize {
        match self {
            LoadOutcome::Loaded { received, .. } | LoadOutcome::NoMatchingColumns { received } => {
                *received
            }
            LoadOutcome::Empty => 0,
        }
    }

    pub fn inserted(&self) -> u64 {
        match self {
            LoadOutcome::Loaded { inserted, .. } => *inserted,
            _ => 0,
        }
    }
}

/// Project `page` through `mapping` and insert it into `table` as one
/// transaction. Rows that collide with the table's unique key are skipped.
pub fn load_page<S: Store + ?Sized>(
    store: &mut S,
    table: &TableRef,
    page: &Page,
    mapping: &SchemaMapping,
) -> Result<LoadOutcome, LoadError> {
    let plan = resolve(Some(mapping), &page.columns)?;
    if !plan.dropped().is_empty() {
        debug!(table = %table, dropped = ?plan.dropped(), "unmapped columns dropped");
    }

    if page.is_empty() {
        return Ok(LoadOutcome::Empty);
    }
    if plan.is_empty() {
        debug!(table = %table, columns = ?page.columns, "no page column matches the mapping");
        return Ok(LoadOutcome::NoMatchingColumns {
            received: page.row_count(),
        });
    }

    let rows: Vec<_> = page.rows.iter().map(|row| plan.project(row)).collect();
    let inserted = store.insert_rows(table, plan.columns(), &rows)?;

    Ok(LoadOutcome::Loaded {
        received: page.row_count(),
        inserted,
    })
}
