//! Criterion benchmarks for the page hot path.
//!
//! Benchmarks:
//! 1. Envelope decoding of a full 100-row history page
//! 2. Column resolution against a realistic quote mapping
//! 3. Row projection of a decoded page

use bondlab_core::domain::Page;
use bondlab_core::fetch::{decode, BlockLayout, BlockRead};
use bondlab_core::schema::{resolve, ColumnSpec, SchemaMapping};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

// ── Helpers ──────────────────────────────────────────────────────────

const COLUMNS: &[&str] = &[
    "BOARDID", "TRADEDATE", "SHORTNAME", "SECID", "NUMTRADES", "VALUE", "LOW", "HIGH", "CLOSE",
    "LEGALCLOSEPRICE", "ACCINT", "WAPRICE", "YIELDCLOSE", "OPEN", "VOLUME", "MARKETPRICE2",
    "MARKETPRICE3", "MATDATE", "DURATION", "YIELDATWAP", "COUPONPERCENT", "COUPONVALUE", "FACEVALUE",
    "CURRENCYID", "FACEUNIT",
];

fn history_body(rows: usize) -> Value {
    let data: Vec<Value> = (0..rows)
        .map(|i| {
            json!([
                "TQOB", "2024-01-03", format!("OFZ {i}"), format!("SU{i:05}RMFS4"), 120, 1.5e7,
                95.1, 96.3, 95.8, 95.8, 12.4, 95.7, 11.92, 95.2, 15000, 95.8, 95.8,
                "2031-05-15", 1800, 11.9, 7.1, 35.4, 1000, "SUR", "SUR"
            ])
        })
        .collect();
    json!({
        "history": {"columns": COLUMNS, "data": data},
        "history.cursor": {"columns": ["INDEX", "TOTAL", "PAGESIZE"], "data": [[0, 1800, 100]]}
    })
}

fn quote_mapping() -> SchemaMapping {
    let specs = ["boardid", "tradedate", "secid", "numtrades", "close", "waprice", "yieldclose", "volume"]
        .iter()
        .map(|c| ColumnSpec::new(*c, "TEXT"))
        .collect();
    SchemaMapping::new("quote", specs).unwrap()
}

fn decoded_page(body: &Value) -> Page {
    match decode(body, "history", BlockLayout::Rows).block {
        BlockRead::Rows(page) => page,
        other => panic!("unexpected block: {other:?}"),
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let body = history_body(100);
    c.bench_function("decode_history_100", |b| {
        b.iter(|| decode(black_box(&body), "history", BlockLayout::Rows))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mapping = quote_mapping();
    c.bench_function("resolve_quote_columns", |b| {
        b.iter(|| resolve(Some(black_box(&mapping)), black_box(COLUMNS)).unwrap())
    });
}

fn bench_project(c: &mut Criterion) {
    let mapping = quote_mapping();
    let page = decoded_page(&history_body(100));
    let plan = resolve(Some(&mapping), &page.columns).unwrap();
    c.bench_function("project_page_100", |b| {
        b.iter(|| {
            black_box(&page)
                .rows
                .iter()
                .map(|row| plan.project(row))
                .collect::<Vec<_>>()
        })
    });
}

criterion_group!(benches, bench_decode, bench_resolve, bench_project);
criterion_main!(benches);
