//! BondLab Core: domain types, column mapping, paginated fetching, storage.
//!
//! This crate contains the ingestion pipeline's building blocks:
//! - Domain types (record kinds, modes, pages, cursors, run parameters)
//! - Declared schema mappings and page-to-table column resolution
//! - Cursor-driven fetching from the MOEX ISS JSON API
//! - PostgreSQL and SQLite stores behind one `Store` trait
//! - Idempotent, one-transaction-per-page loading

pub mod domain;
pub mod fetch;
pub mod load;
pub mod schema;
pub mod storage;

pub use load::{load_page, LoadError, LoadOutcome};
