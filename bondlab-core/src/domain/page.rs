//! Raw API pages and their scalar cells.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One cell of an API response row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text rendering used when a backend binds every value as text.
    /// `None` for NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Int(i) => Some(i.to_string()),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::Text(s) => Some(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Value> for Scalar {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Scalar::Int(i)
                } else if n.is_u64() {
                    // Out of i64 range: keep the exact digits.
                    Scalar::Text(n.to_string())
                } else {
                    n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null)
                }
            }
            Value::String(s) => Scalar::Text(s.clone()),
            nested => Scalar::Text(nested.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

/// One API response unit: a column list and rows aligned with it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl Page {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Offset pagination state reported by the API alongside a data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub index: u64,
    pub total: u64,
    pub page_size: u64,
}

impl Cursor {
    /// Next `start` offset after a page fetched at `start`, or `None` when
    /// the sequence is exhausted.
    pub fn next_start(&self, start: u64) -> Option<u64> {
        if self.page_size == 0 {
            return None;
        }
        let next = start.saturating_add(self.page_size);
        (next < self.total).then_some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(Scalar::from(&json!(null)), Scalar::Null);
        assert_eq!(Scalar::from(&json!(true)), Scalar::Bool(true));
        assert_eq!(Scalar::from(&json!(42)), Scalar::Int(42));
        assert_eq!(Scalar::from(&json!(101.25)), Scalar::Float(101.25));
        assert_eq!(
            Scalar::from(&json!("RU000A0JX0J2")),
            Scalar::Text("RU000A0JX0J2".into())
        );
        assert_eq!(
            Scalar::from(&json!(18446744073709551615u64)),
            Scalar::Text("18446744073709551615".into())
        );
        assert_eq!(Scalar::from(&json!([1, 2])), Scalar::Text("[1,2]".into()));
    }

    #[test]
    fn text_rendering() {
        assert_eq!(Scalar::Null.to_text(), None);
        assert_eq!(Scalar::Float(99.5).to_text().as_deref(), Some("99.5"));
        assert_eq!(Scalar::Bool(false).to_text().as_deref(), Some("false"));
    }

    #[test]
    fn cursor_advances_until_total() {
        let c = Cursor { index: 0, total: 250, page_size: 100 };
        assert_eq!(c.next_start(0), Some(100));
        assert_eq!(c.next_start(100), Some(200));
        assert_eq!(c.next_start(200), None);
    }

    #[test]
    fn zero_page_size_stops() {
        let c = Cursor { index: 0, total: 10, page_size: 0 };
        assert_eq!(c.next_start(0), None);
    }

    #[test]
    fn column_lookup_ignores_case() {
        let page = Page::new(vec!["SECID".into(), "isin".into()], vec![]);
        assert_eq!(page.column_index("ISIN"), Some(1));
        assert_eq!(page.column_index("secid"), Some(0));
        assert_eq!(page.column_index("BOARDID"), None);
    }
}
