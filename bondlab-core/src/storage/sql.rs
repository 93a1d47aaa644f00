//! SQL text generation shared by both backends.
//!
//! Identifiers are always double-quoted so declared column names keep their
//! case. Values never appear in generated text; they are bound as parameters.

use super::{Dialect, TableRef};
use crate::schema::{ColumnSpec, SchemaMapping};

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared type with any length/precision modifier removed:
/// `VARCHAR(36)` → `VARCHAR`, `NUMERIC(18, 6)` → `NUMERIC`.
///
/// Used as the cast target for text parameters on PostgreSQL so that an
/// over-long value fails on assignment instead of being silently truncated.
pub fn cast_type(sql_type: &str) -> String {
    let sql_type = sql_type.trim();
    match (sql_type.find('('), sql_type.find(')')) {
        (Some(open), Some(close)) if open < close => {
            let head = sql_type[..open].trim_end();
            let tail = sql_type[close + 1..].trim_start();
            if tail.is_empty() {
                head.to_string()
            } else {
                format!("{head} {tail}")
            }
        }
        _ => sql_type.to_string(),
    }
}

/// Parameter placeholder for the `n`-th value (1-based) of a column.
fn placeholder(dialect: Dialect, n: usize, spec: &ColumnSpec) -> String {
    match dialect {
        Dialect::Postgres => format!("CAST(${n}::text AS {})", cast_type(&spec.sql_type)),
        Dialect::Sqlite => format!("?{n}"),
    }
}

/// Single-row insert that skips unique-key conflicts.
pub fn insert(dialect: Dialect, table: &TableRef, columns: &[&ColumnSpec]) -> String {
    let names = columns
        .iter()
        .map(|c| quote_ident(&c.column))
        .collect::<Vec<_>>()
        .join(", ");
    let values = columns
        .iter()
        .enumerate()
        .map(|(i, c)| placeholder(dialect, i + 1, c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({values}) ON CONFLICT DO NOTHING",
        table.qualified(dialect)
    )
}

pub fn truncate(dialect: Dialect, table: &TableRef) -> String {
    match dialect {
        Dialect::Postgres => format!("TRUNCATE TABLE {}", table.qualified(dialect)),
        Dialect::Sqlite => format!("DELETE FROM {}", table.qualified(dialect)),
    }
}

/// `CREATE TABLE IF NOT EXISTS` from a schema mapping, with a table-level
/// `UNIQUE` constraint over `unique_key` when one is given.
pub fn create_table(
    dialect: Dialect,
    table: &TableRef,
    mapping: &SchemaMapping,
    unique_key: &[String],
) -> String {
    let mut parts: Vec<String> = mapping
        .columns()
        .iter()
        .map(|c| match c.constraints.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => {
                format!("    {} {} {extra}", quote_ident(&c.column), c.sql_type.trim())
            }
            _ => format!("    {} {}", quote_ident(&c.column), c.sql_type.trim()),
        })
        .collect();

    if !unique_key.is_empty() {
        let key = unique_key
            .iter()
            .map(|k| quote_ident(k))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("    UNIQUE ({key})"));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        table.qualified(dialect),
        parts.join(",\n")
    )
}

/// Index name for a single-column index: `idx_<table>_<column>`.
pub fn index_name(table: &TableRef, column: &str) -> String {
    format!("idx_{}_{}", table.name, column)
}

pub fn create_index(dialect: Dialect, table: &TableRef, column: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        quote_ident(&index_name(table, column)),
        table.qualified(dialect),
        quote_ident(column)
    )
}

pub fn drop_table(dialect: Dialect, table: &TableRef) -> String {
    match dialect {
        Dialect::Postgres => format!("DROP TABLE IF EXISTS {} CASCADE", table.qualified(dialect)),
        Dialect::Sqlite => format!("DROP TABLE IF EXISTS {}", table.qualified(dialect)),
    }
}

pub fn count_rows(dialect: Dialect, table: &TableRef) -> String {
    format!("SELECT COUNT(*) FROM {}", table.qualified(dialect))
}

pub fn count_by(dialect: Dialect, table: &TableRef, column: &str, limit: u32) -> String {
    let col = quote_ident(column);
    format!(
        "SELECT CAST({col} AS TEXT), COUNT(*) FROM {} WHERE {col} IS NOT NULL \
         GROUP BY {col} ORDER BY {col} DESC LIMIT {limit}",
        table.qualified(dialect)
    )
}

pub fn count_distinct(dialect: Dialect, table: &TableRef, column: &str) -> String {
    format!(
        "SELECT COUNT(DISTINCT {}) FROM {}",
        quote_ident(column),
        table.qualified(dialect)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes() -> TableRef {
        TableRef::new(Some("public"), "quotas")
    }

    fn mapping() -> SchemaMapping {
        SchemaMapping::new(
            "quote",
            vec![
                ColumnSpec::new("secid", "VARCHAR(36)").with_constraints("NOT NULL"),
                ColumnSpec::new("tradedate", "DATE").with_constraints("NOT NULL"),
                ColumnSpec::new("close", "NUMERIC(18, 6)"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("shortName"), "\"shortName\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn cast_type_drops_modifiers() {
        assert_eq!(cast_type("VARCHAR(36)"), "VARCHAR");
        assert_eq!(cast_type("NUMERIC(18, 6)"), "NUMERIC");
        assert_eq!(cast_type("TIMESTAMP(3) WITH TIME ZONE"), "TIMESTAMP WITH TIME ZONE");
        assert_eq!(cast_type(" date "), "date");
    }

    #[test]
    fn postgres_insert_casts_text_params() {
        let m = mapping();
        let cols: Vec<&ColumnSpec> = m.columns().iter().collect();
        assert_eq!(
            insert(Dialect::Postgres, &quotes(), &cols),
            "INSERT INTO \"public\".\"quotas\" (\"secid\", \"tradedate\", \"close\") \
             VALUES (CAST($1::text AS VARCHAR), CAST($2::text AS DATE), CAST($3::text AS NUMERIC)) \
             ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn sqlite_insert_uses_numbered_params() {
        let m = mapping();
        let cols: Vec<&ColumnSpec> = m.columns().iter().take(2).collect();
        assert_eq!(
            insert(Dialect::Sqlite, &quotes(), &cols),
            "INSERT INTO \"quotas\" (\"secid\", \"tradedate\") VALUES (?1, ?2) ON CONFLICT DO NOTHING"
        );
    }

    #[test]
    fn create_table_with_unique_key() {
        let ddl = create_table(
            Dialect::Postgres,
            &quotes(),
            &mapping(),
            &["secid".to_string(), "tradedate".to_string()],
        );
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS \"public\".\"quotas\" (\n    \"secid\" VARCHAR(36) NOT NULL,\n    \
             \"tradedate\" DATE NOT NULL,\n    \"close\" NUMERIC(18, 6),\n    UNIQUE (\"secid\", \"tradedate\")\n)"
        );
    }

    #[test]
    fn index_and_drop_statements() {
        assert_eq!(
            create_index(Dialect::Postgres, &quotes(), "tradedate"),
            "CREATE INDEX IF NOT EXISTS \"idx_quotas_tradedate\" ON \"public\".\"quotas\" (\"tradedate\")"
        );
        assert_eq!(
            drop_table(Dialect::Postgres, &quotes()),
            "DROP TABLE IF EXISTS \"public\".\"quotas\" CASCADE"
        );
        assert_eq!(drop_table(Dialect::Sqlite, &quotes()), "DROP TABLE IF EXISTS \"quotas\"");
        assert_eq!(truncate(Dialect::Sqlite, &quotes()), "DELETE FROM \"quotas\"");
    }
}
