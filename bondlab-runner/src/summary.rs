//! Per-kind run outcome.

use crate::plan::IterationStrategy;
use bondlab_core::domain::{Mode, RecordKind};
use std::fmt;

/// Lifecycle of one record kind within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindState {
    Init,
    Clearing,
    Fetching,
    Done,
    Failed,
}

impl fmt::Display for KindState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KindState::Init => "init",
            KindState::Clearing => "clearing",
            KindState::Fetching => "fetching",
            KindState::Done => "done",
            KindState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A request sequence or page that could not be fetched or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// Label of the logical request, e.g. `quotes 2024-01-03`.
    pub request: String,
    /// 1-based position of the page within its request sequence.
    pub page: usize,
    pub error: String,
}

impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {}): {}", self.request, self.page, self.error)
    }
}

/// Counters and outcome of one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub kind: RecordKind,
    pub mode: Mode,
    pub table: Option<String>,
    pub state: KindState,
    pub strategy: Option<IterationStrategy>,
    pub truncated: bool,
    /// Logical request sequences started.
    pub sequences: usize,
    /// HTTP requests issued, paging included.
    pub requests: usize,
    pub pages_fetched: usize,
    pub pages_loaded: usize,
    /// Pages none of whose columns are declared in the mapping.
    pub pages_unmatched: usize,
    pub rows_received: usize,
    /// Rows actually inserted; duplicates skipped by the unique key are excluded.
    pub rows_inserted: u64,
    /// Responses whose expected block was missing or malformed.
    pub shape_warnings: usize,
    pub fetch_failures: Vec<PageFailure>,
    pub page_failures: Vec<PageFailure>,
    /// Why the kind ended in `Failed`.
    pub fatal: Option<String>,
    /// The database connection was lost; nothing further can be stored.
    pub connection_lost: bool,
}

impl RunSummary {
    pub fn new(kind: RecordKind, mode: Mode) -> Self {
        Self {
            kind,
            mode,
            table: None,
            state: KindState::Init,
            strategy: None,
            truncated: false,
            sequences: 0,
            requests: 0,
            pages_fetched: 0,
            pages_loaded: 0,
            pages_unmatched: 0,
            rows_received: 0,
            rows_inserted: 0,
            shape_warnings: 0,
            fetch_failures: Vec::new(),
            page_failures: Vec::new(),
            fatal: None,
            connection_lost: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == KindState::Failed
    }

    /// Whether anything went wrong: the kind failed, or some page or
    /// request could not be processed.
    pub fn has_errors(&self) -> bool {
        self.is_failed() || !self.fetch_failures.is_empty() || !self.page_failures.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} [{}] -> {}: {}",
            self.kind,
            self.mode,
            self.table.as_deref().unwrap_or("?"),
            self.state
        )?;
        if let Some(reason) = &self.fatal {
            writeln!(f, "  fatal: {reason}")?;
        }
        if self.truncated {
            writeln!(f, "  table truncated")?;
        }
        if let Some(strategy) = self.strategy {
            writeln!(
                f,
                "  {strategy}: {} sequences, {} requests, {} pages ({} loaded, {} unmatched)",
                self.sequences,
                self.requests,
                self.pages_fetched,
                self.pages_loaded,
                self.pages_unmatched
            )?;
            writeln!(
                f,
                "  rows: {} received, {} inserted",
                self.rows_received, self.rows_inserted
            )?;
        }
        if self.shape_warnings > 0 {
            writeln!(f, "  data-shape warnings: {}", self.shape_warnings)?;
        }
        for failure in &self.fetch_failures {
            writeln!(f, "  fetch failed: {failure}")?;
        }
        for failure in &self.page_failures {
            writeln!(f, "  page failed: {failure}")?;
        }
        Ok(())
    }
}
