//! BondLab Runner: configuration, ingestion orchestration, table administration.
//!
//! This crate builds on `bondlab-core` to provide:
//! - TOML configuration with a secrets overlay and per-table validation
//! - Store selection (PostgreSQL or SQLite) from the database section
//! - Request planning per record kind and bond-universe enumeration
//! - The per-kind ingestion state machine and its run summary
//! - Destination table administration and statistics

pub mod config;
pub mod connect;
pub mod ingest;
pub mod plan;
pub mod summary;
pub mod tables;
pub mod universe;

pub use config::{
    ApiConfig, AppConfig, Backend, ConfigError, DatabaseConfig, TableSpec, DEFAULT_CONFIG_FILE,
    DEFAULT_SECRETS_FILE,
};
pub use connect::open_store;
pub use ingest::Ingestor;
pub use plan::{plan_requests, IterationStrategy};
pub use summary::{KindState, PageFailure, RunSummary};
pub use tables::{TableAction, TableError, TableListing, TableStats, TableStatus};
pub use universe::enumerate_isins;
