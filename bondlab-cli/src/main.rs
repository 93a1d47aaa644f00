//! BondLab CLI: collect MOEX bond data and administer destination tables.
//!
//! Commands:
//! - `collect`: fetch one or more record kinds from ISS into their tables
//! - `tables`: list, create, drop, clear or summarise the configured tables

mod logging;

use anyhow::{bail, Context, Result};
use bondlab_core::domain::{DateRange, IsinSelection, Mode, RecordKind};
use bondlab_core::fetch::IssClient;
use bondlab_runner::config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE, DEFAULT_SECRETS_FILE};
use bondlab_runner::tables::{self, TableAction, TableError};
use bondlab_runner::{open_store, Ingestor};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "bondlab",
    about = "BondLab: MOEX ISS bond data collector"
)]
struct Cli {
    /// Main configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Secrets file merged over the main configuration. Optional.
    #[arg(long, global = true, default_value = DEFAULT_SECRETS_FILE)]
    secrets: PathBuf,

    /// Log filter when RUST_LOG is not set (e.g. debug, info, bondlab_core=debug).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch data from ISS and load it into the configured tables.
    Collect {
        /// Record kinds: security, quote, coupon, amortization, offer (comma-separated).
        #[arg(long, required = true, value_delimiter = ',')]
        table: Vec<RecordKind>,

        /// First date (YYYY-MM-DD). Defaults to the day before --date-to.
        #[arg(long)]
        date_from: Option<String>,

        /// Last date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date_to: Option<String>,

        /// Restrict to these ISINs (comma-separated).
        #[arg(long, value_delimiter = ',', conflicts_with = "universe")]
        isin: Vec<String>,

        /// Enumerate every listed bond and fetch per ISIN.
        #[arg(long, default_value_t = false)]
        universe: bool,

        /// clear, update or overwrite.
        #[arg(long, default_value = "update")]
        mode: Mode,
    },
    /// Administer the configured destination tables.
    Tables {
        /// list, create, drop, clear or stats.
        #[arg(long)]
        action: TableAction,

        /// Record kind to act on. Defaults to every configured kind.
        #[arg(long)]
        table: Option<RecordKind>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = AppConfig::load(&cli.config, Some(&cli.secrets))
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    for (kind, e) in config.table_errors() {
        warn!(%kind, error = %e, "table configuration is invalid; this kind is disabled");
    }

    match cli.command {
        Commands::Collect {
            table,
            date_from,
            date_to,
            isin,
            universe,
            mode,
        } => run_collect(&config, table, date_from, date_to, isin, universe, mode),
        Commands::Tables { action, table } => run_tables(&config, action, table),
    }
}

fn parse_date(raw: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid {flag} '{raw}': expected YYYY-MM-DD"))
}

fn resolve_dates(date_from: Option<String>, date_to: Option<String>) -> Result<DateRange> {
    let end = date_to
        .as_deref()
        .map(|s| parse_date(s, "--date-to"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = date_from
        .as_deref()
        .map(|s| parse_date(s, "--date-from"))
        .transpose()?
        .unwrap_or_else(|| end - chrono::Duration::days(1));
    Ok(DateRange::new(start, end)?)
}

fn resolve_isins(isin: Vec<String>, universe: bool) -> Result<IsinSelection> {
    if universe {
        return Ok(IsinSelection::Universe);
    }
    if isin.is_empty() {
        return Ok(IsinSelection::All);
    }
    let selection = IsinSelection::explicit(isin);
    if selection.explicit_isins().map_or(true, |s| s.is_empty()) {
        bail!("--isin was given but contains no ISINs");
    }
    Ok(selection)
}

fn run_collect(
    config: &AppConfig,
    kinds: Vec<RecordKind>,
    date_from: Option<String>,
    date_to: Option<String>,
    isin: Vec<String>,
    universe: bool,
    mode: Mode,
) -> Result<ExitCode> {
    let dates = resolve_dates(date_from, date_to)?;
    let isins = resolve_isins(isin, universe)?;
    let mut unique_kinds: Vec<RecordKind> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !unique_kinds.contains(&kind) {
            unique_kinds.push(kind);
        }
    }

    let source = IssClient::new(
        Duration::from_secs(config.api.timeout_secs),
        config.api.max_retries,
    )?;
    let mut store = open_store(&config.database).context("database connection failed")?;

    let summaries = Ingestor::new(config, &source).run_all(
        store.as_mut(),
        &unique_kinds,
        dates,
        &isins,
        mode,
    );

    println!("Collection summary ({} .. {}):", dates.start(), dates.end());
    for summary in &summaries {
        print!("{summary}");
    }

    let failed = summaries.iter().filter(|s| s.has_errors()).count();
    if failed > 0 {
        eprintln!("{failed} of {} kinds reported errors", summaries.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_tables(config: &AppConfig, action: TableAction, table: Option<RecordKind>) -> Result<ExitCode> {
    let mut store = open_store(&config.database).context("database connection failed")?;
    let kinds: Vec<RecordKind> = match table {
        Some(kind) => vec![kind],
        None => RecordKind::ALL.to_vec(),
    };

    match action {
        TableAction::List => {
            println!("Configured tables:");
            for entry in tables::list_tables(config, store.as_mut()) {
                if kinds.contains(&entry.kind) {
                    println!("  {entry}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        TableAction::Stats => {
            for kind in kinds {
                match config.table(kind) {
                    Ok(spec) => print!("{}", tables::table_stats(store.as_mut(), spec)),
                    Err(ConfigError::MissingTable { .. }) if table.is_none() => {}
                    Err(e) => eprintln!("{kind}: {e}"),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        TableAction::Create | TableAction::Drop | TableAction::Clear => {
            let mut failures = 0;
            for kind in kinds {
                match tables::apply(config, store.as_mut(), action, kind) {
                    Ok(()) => {}
                    Err(TableError::Config(ConfigError::MissingTable { .. })) if table.is_none() => {
                        info!(%kind, "no table configured, skipping");
                    }
                    Err(e) => {
                        eprintln!("{kind}: {e}");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
