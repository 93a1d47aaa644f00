//! Bond universe enumeration.
//!
//! Walks the full securities listing and returns every distinct ISIN in the
//! order the exchange lists them.

use bondlab_core::domain::Scalar;
use bondlab_core::fetch::{fetch_all, Endpoints, FetchError, JsonSource};
use std::collections::HashSet;
use tracing::info;

pub fn enumerate_isins<S: JsonSource + ?Sized>(
    source: &S,
    endpoints: &Endpoints,
    limit: u64,
) -> Result<Vec<String>, FetchError> {
    let pages = fetch_all(source, endpoints.securities_all(), limit)?;

    let mut isins: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for page in &pages {
        let Some(idx) = page.column_index("ISIN") else {
            continue;
        };
        for row in &page.rows {
            let Some(Scalar::Text(isin)) = row.get(idx) else {
                continue;
            };
            let isin = isin.trim().to_ascii_uppercase();
            if !isin.is_empty() && seen.insert(isin.clone()) {
                isins.push(isin);
            }
        }
    }

    info!(pages = pages.len(), isins = isins.len(), "enumerated bond universe");
    Ok(isins)
}
