//! Ingestion orchestrator.
//!
//! For each record kind the orchestrator walks `Init → [Clearing] →
//! Fetching → Done`, or ends in `Failed`:
//!
//! 1. Init: look up the kind's table and schema mapping; check the table exists
//! 2. Clearing: `clear` and `overwrite` truncate the table; `clear` stops here
//! 3. Fetching: resolve the ISIN selection, plan the request sequences and
//!    stream every page straight into the loader
//!
//! Only configuration problems, a failed truncate, a failed universe
//! enumeration and a lost database connection fail a kind. A request that
//! cannot be fetched or a page that cannot be stored is recorded in the
//! summary and the run moves on to the next page or sequence.
//!
//! A lost connection also ends the whole run: the kinds after it are
//! reported as failed without further requests.

use crate::config::{AppConfig, TableSpec};
use crate::plan::plan_requests;
use crate::summary::{KindState, PageFailure, RunSummary};
use crate::universe::enumerate_isins;
use bondlab_core::domain::{DateRange, IsinSelection, Mode, RecordKind, RunParams};
use bondlab_core::fetch::{Endpoints, FetchRequest, JsonSource, PageStream};
use bondlab_core::storage::Store;
use bondlab_core::{load_page, LoadOutcome};
use tracing::{info, warn};

/// Drives record kinds through fetch and load against one source and store.
pub struct Ingestor<'a, S: JsonSource + ?Sized> {
    config: &'a AppConfig,
    source: &'a S,
    endpoints: Endpoints,
    /// Enumerated once per invocation and shared by every kind.
    universe: Option<Vec<String>>,
}

impl<'a, S: JsonSource + ?Sized> Ingestor<'a, S> {
    pub fn new(config: &'a AppConfig, source: &'a S) -> Self {
        Self {
            config,
            source,
            endpoints: Endpoints::new(&config.api.base_url),
            universe: None,
        }
    }

    /// Run several kinds one after another on the same store. Once a kind
    /// loses the database connection, the remaining kinds are reported as
    /// failed without touching the store or the API.
    pub fn run_all<St: Store + ?Sized>(
        &mut self,
        store: &mut St,
        kinds: &[RecordKind],
        dates: DateRange,
        isins: &IsinSelection,
        mode: Mode,
    ) -> Vec<RunSummary> {
        let mut summaries = Vec::with_capacity(kinds.len());
        let mut connection_lost = false;
        for &kind in kinds {
            if connection_lost {
                let mut summary = RunSummary::new(kind, mode);
                summary.table = self.config.table(kind).ok().map(|spec| spec.table.to_string());
                fail(&mut summary, "skipped: database connection was lost".into());
                warn!(%kind, "skipped, database connection was lost");
                summaries.push(summary);
                continue;
            }
            let params = RunParams::new(kind, dates, isins.clone(), mode);
            let summary = self.run(store, &params);
            connection_lost = summary.connection_lost;
            summaries.push(summary);
        }
        summaries
    }

    /// Run one kind to completion and report what happened.
    pub fn run<St: Store + ?Sized>(&mut self, store: &mut St, params: &RunParams) -> RunSummary {
        let mut summary = RunSummary::new(params.kind, params.mode);
        info!(
            kind = %params.kind,
            mode = %params.mode,
            from = %params.dates.start(),
            to = %params.dates.end(),
            "starting"
        );

        self.drive(store, params, &mut summary);

        if summary.is_failed() {
            warn!(
                kind = %summary.kind,
                reason = summary.fatal.as_deref().unwrap_or("unknown"),
                "kind failed"
            );
        } else {
            info!(
                kind = %summary.kind,
                requests = summary.requests,
                pages = summary.pages_fetched,
                rows_received = summary.rows_received,
                rows_inserted = summary.rows_inserted,
                fetch_failures = summary.fetch_failures.len(),
                page_failures = summary.page_failures.len(),
                "finished"
            );
        }
        summary
    }

    fn drive<St: Store + ?Sized>(
        &mut self,
        store: &mut St,
        params: &RunParams,
        summary: &mut RunSummary,
    ) {
        let config = self.config;

        // Init
        let spec = match config.table(params.kind) {
            Ok(spec) => spec,
            Err(e) => return fail(summary, e.to_string()),
        };
        summary.table = Some(spec.table.to_string());
        match store.table_exists(&spec.table) {
            Ok(true) => {}
            Ok(false) => {
                return fail(
                    summary,
                    format!("table {} does not exist; create it with `tables --action create`", spec.table),
                )
            }
            Err(e) => return fail_storage(summary, e.is_fatal(), e.to_string()),
        }

        // Clearing
        if params.mode.truncates() {
            summary.state = KindState::Clearing;
            if let Err(e) = store.truncate(&spec.table) {
                return fail_storage(summary, e.is_fatal(), format!("truncate {}: {e}", spec.table));
            }
            summary.truncated = true;
            info!(table = %spec.table, "table truncated");
        }
        if !params.mode.fetches() {
            summary.state = KindState::Done;
            return;
        }

        // Fetching
        summary.state = KindState::Fetching;
        let isins = match self.resolve_isins(&params.isins) {
            Ok(isins) => isins,
            Err(reason) => return fail(summary, reason),
        };
        let (strategy, requests) =
            plan_requests(&self.endpoints, params.kind, &params.dates, isins.as_deref());
        summary.strategy = Some(strategy);
        info!(kind = %params.kind, %strategy, sequences = requests.len(), "fetching");

        let limit = config.api.default_limit;
        for request in requests {
            summary.sequences += 1;
            if let Err(reason) = self.run_sequence(store, spec, request, limit, summary) {
                return fail_storage(summary, true, reason);
            }
        }

        summary.state = KindState::Done;
    }

    /// Stream one request sequence into the table. `Err` means the store is
    /// no longer usable.
    fn run_sequence<St: Store + ?Sized>(
        &self,
        store: &mut St,
        spec: &TableSpec,
        request: FetchRequest,
        limit: u64,
        summary: &mut RunSummary,
    ) -> Result<(), String> {
        let label = request.label.clone();
        let mut stream = PageStream::new(self.source, request, limit);
        let mut page_no = 0;

        let result = loop {
            let Some(item) = stream.next() else {
                break Ok(());
            };
            page_no += 1;

            let page = match item {
                Ok(page) => page,
                Err(e) => {
                    summary.fetch_failures.push(PageFailure {
                        request: label.clone(),
                        page: page_no,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            summary.pages_fetched += 1;
            summary.rows_received += page.row_count();

            match load_page(store, &spec.table, &page, &spec.mapping) {
                Ok(LoadOutcome::Loaded { received, inserted }) => {
                    summary.pages_loaded += 1;
                    summary.rows_inserted += inserted;
                    info!(
                        request = %label,
                        page = page_no,
                        rows = received,
                        inserted,
                        "page loaded"
                    );
                }
                Ok(LoadOutcome::NoMatchingColumns { received }) => {
                    summary.pages_unmatched += 1;
                    warn!(request = %label, page = page_no, rows = received, "no columns match the mapping");
                }
                Ok(LoadOutcome::Empty) => {}
                Err(e) if e.is_fatal() => break Err(e.to_string()),
                Err(e) => {
                    warn!(request = %label, page = page_no, error = %e, "page rolled back");
                    summary.page_failures.push(PageFailure {
                        request: label.clone(),
                        page: page_no,
                        error: e.to_string(),
                    });
                }
            }
        };

        summary.requests += stream.requests();
        if stream.end().is_some_and(|end| end.is_shape_warning()) {
            summary.shape_warnings += 1;
        }
        result
    }

    /// `None` means all instruments through the global endpoints.
    fn resolve_isins(&mut self, selection: &IsinSelection) -> Result<Option<Vec<String>>, String> {
        match selection {
            IsinSelection::Explicit(isins) => Ok(Some(isins.clone())),
            IsinSelection::All => Ok(None),
            IsinSelection::Universe => {
                if let Some(universe) = &self.universe {
                    return Ok(Some(universe.clone()));
                }
                let isins = enumerate_isins(self.source, &self.endpoints, self.config.api.default_limit)
                    .map_err(|e| format!("universe enumeration failed: {e}"))?;
                if isins.is_empty() {
                    return Err("universe enumeration returned no ISINs".into());
                }
                self.universe = Some(isins.clone());
                Ok(Some(isins))
            }
        }
    }
}

fn fail(summary: &mut RunSummary, reason: String) {
    summary.state = KindState::Failed;
    summary.fatal = Some(reason);
}

fn fail_storage(summary: &mut RunSummary, connection_lost: bool, reason: String) {
    summary.connection_lost = connection_lost;
    fail(summary, reason);
}
