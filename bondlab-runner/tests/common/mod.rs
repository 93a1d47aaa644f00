//! Shared fixtures for runner integration tests.
#![allow(dead_code)]

use bondlab_core::domain::RecordKind;
use bondlab_core::fetch::{FetchError, JsonSource};
use bondlab_core::storage::{SqliteStore, Store};
use bondlab_runner::config::AppConfig;
use bondlab_runner::tables;
use serde_json::{json, Value};
use std::cell::RefCell;

pub const BASE: &str = "http://iss.test/iss";

pub type Handler = Box<dyn Fn(&str, &[(String, String)]) -> Result<Value, FetchError>>;

/// Answers every request through a handler and records what was asked.
pub struct FakeIss {
    handler: Handler,
    calls: RefCell<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeIss {
    pub fn new(handler: impl Fn(&str, &[(String, String)]) -> Result<Value, FetchError> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Fails any request it receives.
    pub fn unreachable() -> Self {
        Self::new(|url, _| Err(FetchError::Network(format!("unexpected request to {url}"))))
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(u, _)| u.clone()).collect()
    }

    /// Values of one query parameter across all calls, in call order.
    pub fn param(&self, name: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|(_, q)| q.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()))
            .collect()
    }
}

impl JsonSource for FakeIss {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError> {
        self.calls.borrow_mut().push((url.to_string(), query.to_vec()));
        (self.handler)(url, query)
    }
}

pub fn param<'q>(query: &'q [(String, String)], name: &str) -> Option<&'q str> {
    query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// A response with one block and its cursor.
pub fn block(name: &str, columns: &[&str], data: Vec<Value>, index: u64, total: u64, pagesize: u64) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(name.into(), json!({ "columns": columns, "data": data }));
    body.insert(
        format!("{name}.cursor"),
        json!({ "columns": ["INDEX", "TOTAL", "PAGESIZE"], "data": [[index, total, pagesize]] }),
    );
    Value::Object(body)
}

pub const CONFIG: &str = r#"
[api]
base_url = "http://iss.test/iss"
default_limit = 100

[database]
backend = "sqlite"
path = "unused.sqlite"

[tables.security]
name = "bonds"
unique_key = ["secid"]
columns = [
    { column = "secid", type = "VARCHAR(36)", constraints = "NOT NULL" },
    { column = "isin", type = "VARCHAR(36)" },
    { column = "shortname", type = "VARCHAR(189)" },
    { column = "matdate", type = "DATE" },
]

[tables.quote]
name = "quotes"
unique_key = ["secid", "tradedate", "boardid"]
columns = [
    { column = "secid", type = "VARCHAR(36)", constraints = "NOT NULL" },
    { column = "tradedate", type = "DATE", constraints = "NOT NULL" },
    { column = "boardid", type = "VARCHAR(12)", constraints = "NOT NULL" },
    { column = "close", type = "NUMERIC" },
]

[tables.coupon]
name = "coupons"
unique_key = ["isin", "coupondate"]
columns = [
    { column = "isin", type = "VARCHAR(36)", constraints = "NOT NULL" },
    { column = "coupondate", type = "DATE", constraints = "NOT NULL" },
    { column = "value", type = "NUMERIC" },
]

[tables.amortization]
name = "amortizations"
unique_key = ["isin", "amortdate"]
columns = [
    { column = "isin", type = "VARCHAR(36)", constraints = "NOT NULL" },
    { column = "amortdate", type = "DATE", constraints = "NOT NULL" },
    { column = "value", type = "NUMERIC" },
]

[tables.offer]
name = "offers"
unique_key = ["isin", "offerdate"]
columns = [
    { column = "isin", type = "VARCHAR(36)", constraints = "NOT NULL" },
    { column = "offerdate", type = "DATE", constraints = "NOT NULL" },
    { column = "offertype", type = "VARCHAR(50)" },
]
"#;

pub fn config() -> AppConfig {
    AppConfig::from_toml(CONFIG, None).unwrap()
}

/// In-memory store with every configured table created.
pub fn store_with_tables(config: &AppConfig) -> SqliteStore {
    let mut store = SqliteStore::in_memory().unwrap();
    for kind in RecordKind::ALL {
        tables::create_table(&mut store, config.table(kind).unwrap()).unwrap();
    }
    store
}

pub fn count(store: &mut SqliteStore, kind: RecordKind, config: &AppConfig) -> u64 {
    store.count_rows(&config.table(kind).unwrap().table).unwrap()
}
