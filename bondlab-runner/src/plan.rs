//! Iteration strategy per record kind.
//!
//! | Kind                          | All instruments  | Selected ISINs      |
//! |-------------------------------|------------------|---------------------|
//! | security                      | GlobalPaginated  | ByIsin (one-shot)   |
//! | quote                         | ByDate           | ByIsinAndDate       |
//! | coupon / amortization / offer | GlobalPaginated  | ByIsin              |

use bondlab_core::domain::{DateRange, RecordKind};
use bondlab_core::fetch::{Endpoints, FetchRequest};
use std::fmt;

/// How the requests of one kind are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationStrategy {
    /// One request sequence per ISIN.
    ByIsin,
    /// One paginated sequence per date over all instruments.
    ByDate,
    /// One sequence per (date, ISIN), dates outermost.
    ByIsinAndDate,
    /// A single paginated sequence over all instruments.
    GlobalPaginated,
}

impl IterationStrategy {
    /// `per_isin` is true when the run covers an explicit or enumerated ISIN list.
    pub fn for_kind(kind: RecordKind, per_isin: bool) -> Self {
        match (kind, per_isin) {
            (RecordKind::Quote, true) => IterationStrategy::ByIsinAndDate,
            (RecordKind::Quote, false) => IterationStrategy::ByDate,
            (_, true) => IterationStrategy::ByIsin,
            (_, false) => IterationStrategy::GlobalPaginated,
        }
    }
}

impl fmt::Display for IterationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IterationStrategy::ByIsin => "by-isin",
            IterationStrategy::ByDate => "by-date",
            IterationStrategy::ByIsinAndDate => "by-isin-and-date",
            IterationStrategy::GlobalPaginated => "global-paginated",
        };
        f.write_str(s)
    }
}

/// Lay out every logical request for `kind`, in issue order.
///
/// `isins` is `None` when the run covers all instruments through the global
/// endpoints.
pub fn plan_requests(
    endpoints: &Endpoints,
    kind: RecordKind,
    dates: &DateRange,
    isins: Option<&[String]>,
) -> (IterationStrategy, Vec<FetchRequest>) {
    let strategy = IterationStrategy::for_kind(kind, isins.is_some());
    let isins = isins.unwrap_or(&[]);

    let requests = match (kind, strategy) {
        (RecordKind::Security, IterationStrategy::ByIsin) => {
            isins.iter().map(|isin| endpoints.security_by_isin(isin)).collect()
        }
        (RecordKind::Security, _) => vec![endpoints.securities_all()],
        (RecordKind::Quote, IterationStrategy::ByIsinAndDate) => dates
            .days()
            .flat_map(|date| isins.iter().map(move |isin| endpoints.quotes_by_isin(isin, date)))
            .collect(),
        (RecordKind::Quote, _) => dates.days().map(|date| endpoints.quotes_all(date)).collect(),
        (_, IterationStrategy::ByIsin) => isins
            .iter()
            .filter_map(|isin| endpoints.schedules_by_isin(kind, isin))
            .collect(),
        (_, _) => endpoints.schedules_all(kind).into_iter().collect(),
    };

    (strategy, requests)
}
