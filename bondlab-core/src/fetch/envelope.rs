//! Decoding of ISS response envelopes.
//!
//! An ISS response is a JSON object keyed by block name:
//!
//! ```json
//! { "history": {"columns": ["BOARDID", "TRADEDATE"], "data": [["TQOB", "2024-01-03"]]},
//!   "history.cursor": {"columns": ["INDEX", "TOTAL", "PAGESIZE"], "data": [[0, 1, 100]]} }
//! ```
//!
//! Each request knows which block it expects; the block is decoded into a
//! [`BlockRead`] that distinguishes rows, an empty block, a missing block and
//! an unexpected shape.

use crate::domain::{Cursor, Page, Scalar};
use serde::Deserialize;
use serde_json::Value;

/// How a block's rows are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
    /// One record per row, one field per column.
    Rows,
    /// One field per row as `name`/`value` pairs, pivoted into a single record.
    NameValue,
}

/// Outcome of decoding the expected block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockRead {
    Rows(Page),
    /// Block present with no rows.
    Empty,
    /// Block not in the response at all.
    Absent,
    /// Block present but not shaped as `{columns, data}`.
    Malformed(String),
}

/// A decoded response: the expected block plus its cursor, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub block: BlockRead,
    pub cursor: Option<Cursor>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

/// Decode the block named `block` (and `<block>.cursor`) from a response body.
pub fn decode(body: &Value, block: &str, layout: BlockLayout) -> Envelope {
    let block_read = match body.get(block) {
        None => BlockRead::Absent,
        Some(raw) => match RawBlock::deserialize(raw) {
            Err(e) => BlockRead::Malformed(format!("block '{block}': {e}")),
            Ok(raw) if raw.data.is_empty() => BlockRead::Empty,
            Ok(raw) => match layout {
                BlockLayout::Rows => BlockRead::Rows(rows_page(raw)),
                BlockLayout::NameValue => pivot_name_value(block, raw),
            },
        },
    };

    let cursor = body
        .get(format!("{block}.cursor"))
        .and_then(|raw| RawBlock::deserialize(raw).ok())
        .and_then(|raw| decode_cursor(&raw));

    Envelope {
        block: block_read,
        cursor,
    }
}

fn rows_page(raw: RawBlock) -> Page {
    let rows = raw
        .data
        .iter()
        .map(|row| row.iter().map(Scalar::from).collect())
        .collect();
    Page::new(raw.columns, rows)
}

fn pivot_name_value(block: &str, raw: RawBlock) -> BlockRead {
    let find = |wanted: &str| raw.columns.iter().position(|c| c.eq_ignore_ascii_case(wanted));
    let (Some(name_idx), Some(value_idx)) = (find("name"), find("value")) else {
        return BlockRead::Malformed(format!(
            "block '{block}' has no name/value columns: {:?}",
            raw.columns
        ));
    };

    let mut columns = Vec::with_capacity(raw.data.len());
    let mut values = Vec::with_capacity(raw.data.len());
    for row in &raw.data {
        let Some(name) = row.get(name_idx).and_then(Value::as_str) else {
            continue;
        };
        if columns.iter().any(|c: &String| c.eq_ignore_ascii_case(name)) {
            continue;
        }
        columns.push(name.to_string());
        values.push(row.get(value_idx).map(Scalar::from).unwrap_or(Scalar::Null));
    }

    if columns.is_empty() {
        return BlockRead::Empty;
    }
    BlockRead::Rows(Page::new(columns, vec![values]))
}

/// Read (index, total, pagesize) from the first cursor row. Named columns
/// win when present, otherwise the triple is read positionally.
fn decode_cursor(raw: &RawBlock) -> Option<Cursor> {
    let row = raw.data.first()?;
    let pos = |name: &str, fallback: usize| {
        raw.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .unwrap_or(fallback)
    };
    let num = |i: usize| row.get(i).and_then(Value::as_u64);

    Some(Cursor {
        index: num(pos("INDEX", 0))?,
        total: num(pos("TOTAL", 1))?,
        page_size: num(pos("PAGESIZE", 2))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_rows_and_cursor() {
        let body = json!({
            "history": {"columns": ["SECID", "CLOSE"], "data": [["SU26238RMFS4", 61.2], ["SU26240RMFS0", null]]},
            "history.cursor": {"columns": ["INDEX", "TOTAL", "PAGESIZE"], "data": [[0, 250, 100]]}
        });
        let env = decode(&body, "history", BlockLayout::Rows);
        let BlockRead::Rows(page) = env.block else {
            panic!("expected rows, got {:?}", env.block);
        };
        assert_eq!(page.columns, vec!["SECID", "CLOSE"]);
        assert_eq!(page.rows[0][1], Scalar::Float(61.2));
        assert_eq!(page.rows[1][1], Scalar::Null);
        assert_eq!(env.cursor, Some(Cursor { index: 0, total: 250, page_size: 100 }));
    }

    #[test]
    fn distinguishes_empty_absent_and_malformed() {
        let empty = json!({"coupons": {"columns": ["ISIN"], "data": []}});
        assert_eq!(decode(&empty, "coupons", BlockLayout::Rows).block, BlockRead::Empty);

        let absent = json!({"offers": {"columns": ["ISIN"], "data": [["X"]]}});
        assert_eq!(decode(&absent, "coupons", BlockLayout::Rows).block, BlockRead::Absent);

        let malformed = json!({"coupons": [1, 2, 3]});
        assert!(matches!(
            decode(&malformed, "coupons", BlockLayout::Rows).block,
            BlockRead::Malformed(_)
        ));
    }

    #[test]
    fn missing_cursor_is_none() {
        let body = json!({"securities": {"columns": ["SECID"], "data": [["A"]]}});
        assert_eq!(decode(&body, "securities", BlockLayout::Rows).cursor, None);
    }

    #[test]
    fn cursor_with_reordered_columns() {
        let body = json!({
            "coupons": {"columns": ["ISIN"], "data": [["X"]]},
            "coupons.cursor": {"columns": ["PAGESIZE", "INDEX", "TOTAL"], "data": [[20, 40, 95]]}
        });
        let env = decode(&body, "coupons", BlockLayout::Rows);
        assert_eq!(env.cursor, Some(Cursor { index: 40, total: 95, page_size: 20 }));
    }

    #[test]
    fn cursor_without_rows_is_none() {
        let body = json!({
            "coupons": {"columns": ["ISIN"], "data": [["X"]]},
            "coupons.cursor": {"columns": ["INDEX", "TOTAL", "PAGESIZE"], "data": []}
        });
        assert_eq!(decode(&body, "coupons", BlockLayout::Rows).cursor, None);
    }

    #[test]
    fn pivots_description_block() {
        let body = json!({
            "description": {
                "columns": ["name", "title", "value", "type"],
                "data": [
                    ["SECID", "Код ценной бумаги", "SU26238RMFS4", "string"],
                    ["ISIN", "ISIN код", "RU000A1038V6", "string"],
                    ["FACEVALUE", "Номинал", "1000", "number"]
                ]
            }
        });
        let env = decode(&body, "description", BlockLayout::NameValue);
        let BlockRead::Rows(page) = env.block else {
            panic!("expected rows");
        };
        assert_eq!(page.columns, vec!["SECID", "ISIN", "FACEVALUE"]);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0][2], Scalar::Text("1000".into()));
    }

    #[test]
    fn description_without_name_value_is_malformed() {
        let body = json!({"description": {"columns": ["a", "b"], "data": [["x", "y"]]}});
        assert!(matches!(
            decode(&body, "description", BlockLayout::NameValue).block,
            BlockRead::Malformed(_)
        ));
    }
}
