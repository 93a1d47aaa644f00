//! Column resolution: which page columns feed which destination columns.

use super::{ColumnSpec, ConfigurationError, SchemaMapping};
use crate::domain::Scalar;

/// Positional correspondence between destination columns and page columns.
///
/// `columns[i]` receives the value at `source_indices[i]` of every page row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPlan<'m> {
    columns: Vec<&'m ColumnSpec>,
    source_indices: Vec<usize>,
    dropped: Vec<String>,
}

impl<'m> ColumnPlan<'m> {
    pub fn columns(&self) -> &[&'m ColumnSpec] {
        &self.columns
    }

    /// Destination column names, in resolution order.
    pub fn destination_columns(&self) -> Vec<&'m str> {
        self.columns.iter().map(|c| c.column.as_str()).collect()
    }

    pub fn source_indices(&self) -> &[usize] {
        &self.source_indices
    }

    /// Page columns that had no counterpart in the mapping.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Build one destination row. Indices past the end of a short row
    /// produce NULL.
    pub fn project(&self, row: &[Scalar]) -> Vec<Scalar> {
        self.source_indices
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(Scalar::Null))
            .collect()
    }
}

/// Resolve a page's column names against a schema mapping.
///
/// Page columns not declared in the mapping are dropped. When a page repeats
/// a column name only its first occurrence is used.
pub fn resolve<'m, S: AsRef<str>>(
    mapping: Option<&'m SchemaMapping>,
    external_columns: &[S],
) -> Result<ColumnPlan<'m>, ConfigurationError> {
    let mapping = mapping.ok_or_else(|| ConfigurationError::MissingMapping {
        kind: "unknown".into(),
    })?;
    if mapping.is_empty() {
        return Err(ConfigurationError::EmptyMapping {
            kind: mapping.kind().to_string(),
        });
    }

    let mut columns: Vec<&'m ColumnSpec> = Vec::new();
    let mut source_indices = Vec::new();
    let mut dropped = Vec::new();

    for (i, name) in external_columns.iter().enumerate() {
        let name = name.as_ref();
        match mapping.lookup(name) {
            Some(spec) if !columns.iter().any(|c| std::ptr::eq(*c, spec)) => {
                columns.push(spec);
                source_indices.push(i);
            }
            Some(_) => {}
            None => dropped.push(name.to_string()),
        }
    }

    Ok(ColumnPlan {
        columns,
        source_indices,
        dropped,
    })
}
