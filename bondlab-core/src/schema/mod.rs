//! Declared destination schemas.
//!
//! A [`SchemaMapping`] is the single source of truth for one record kind's
//! destination table: it drives both `CREATE TABLE` generation and the
//! projection of API pages onto table columns. Mappings are validated once
//! when configuration is loaded and never change afterwards.

pub mod mapper;

pub use mapper::{resolve, ColumnPlan};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors in a declared schema mapping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no schema mapping declared for '{kind}'")]
    MissingMapping { kind: String },

    #[error("schema mapping for '{kind}' declares no columns")]
    EmptyMapping { kind: String },

    #[error("schema mapping for '{kind}' maps API field '{field}' more than once")]
    DuplicateSource { kind: String, field: String },

    #[error("schema mapping for '{kind}' declares column '{column}' more than once")]
    DuplicateColumn { kind: String, column: String },

    #[error("schema mapping for '{kind}' has a column with an empty {what}")]
    BlankName { kind: String, what: &'static str },
}

/// One destination column and the API field that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Destination column name, case preserved.
    pub column: String,
    /// Declared SQL type, e.g. `DATE` or `NUMERIC(18, 6)`.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Extra column constraints for DDL, e.g. `NOT NULL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    /// API field name. Defaults to the column name upper-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ColumnSpec {
    pub fn new(column: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            sql_type: sql_type.into(),
            constraints: None,
            source: None,
        }
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Normalised (upper-case) API field name.
    pub fn source_key(&self) -> String {
        self.source
            .as_deref()
            .unwrap_or(&self.column)
            .trim()
            .to_ascii_uppercase()
    }
}

/// Ordered external-field → destination-column mapping for one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    kind: String,
    columns: Vec<ColumnSpec>,
    by_source: HashMap<String, usize>,
}

impl SchemaMapping {
    /// Validate and index a list of column declarations.
    pub fn new(kind: impl Into<String>, columns: Vec<ColumnSpec>) -> Result<Self, ConfigurationError> {
        let kind = kind.into();
        if columns.is_empty() {
            return Err(ConfigurationError::EmptyMapping { kind });
        }

        let mut by_source = HashMap::with_capacity(columns.len());
        let mut seen_columns: Vec<&str> = Vec::with_capacity(columns.len());
        for (i, spec) in columns.iter().enumerate() {
            if spec.column.trim().is_empty() {
                return Err(ConfigurationError::BlankName { kind, what: "column name" });
            }
            if spec.sql_type.trim().is_empty() {
                return Err(ConfigurationError::BlankName { kind, what: "type" });
            }
            let key = spec.source_key();
            if key.is_empty() {
                return Err(ConfigurationError::BlankName { kind, what: "source field" });
            }
            if by_source.insert(key.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateSource { kind, field: key });
            }
            if seen_columns.contains(&spec.column.as_str()) {
                return Err(ConfigurationError::DuplicateColumn {
                    kind,
                    column: spec.column.clone(),
                });
            }
            seen_columns.push(&spec.column);
        }

        Ok(Self {
            kind,
            columns,
            by_source,
        })
    }

    /// Record kind (or table key) this mapping belongs to.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Declared columns in declaration order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Look up the column fed by an API field, case-insensitively.
    pub fn lookup(&self, external: &str) -> Option<&ColumnSpec> {
        self.by_source
            .get(&external.trim().to_ascii_uppercase())
            .map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.column == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("secid", "VARCHAR(36)").with_constraints("NOT NULL"),
            ColumnSpec::new("shortName", "VARCHAR(189)"),
            ColumnSpec::new("face_value", "NUMERIC").with_source("FACEVALUE"),
        ]
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let m = SchemaMapping::new("security", specs()).unwrap();
        assert_eq!(m.lookup("SECID").unwrap().column, "secid");
        assert_eq!(m.lookup("shortname").unwrap().column, "shortName");
        assert_eq!(m.lookup("FaceValue").unwrap().column, "face_value");
        assert!(m.lookup("face_value").is_none());
    }

    #[test]
    fn empty_mapping_is_rejected() {
        let err = SchemaMapping::new("offer", vec![]).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyMapping { kind: "offer".into() });
    }

    #[test]
    fn duplicate_source_is_rejected() {
        let cols = vec![
            ColumnSpec::new("isin", "TEXT"),
            ColumnSpec::new("isin_copy", "TEXT").with_source("isin"),
        ];
        let err = SchemaMapping::new("coupon", cols).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateSource { field, .. } if field == "ISIN"));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let cols = vec![
            ColumnSpec::new("isin", "TEXT"),
            ColumnSpec::new("isin", "TEXT").with_source("SECID"),
        ];
        let err = SchemaMapping::new("coupon", cols).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateColumn { .. }));
    }

    #[test]
    fn blank_type_is_rejected() {
        let err = SchemaMapping::new("quote", vec![ColumnSpec::new("secid", " ")]).unwrap_err();
        assert!(matches!(err, ConfigurationError::BlankName { what: "type", .. }));
    }
}
