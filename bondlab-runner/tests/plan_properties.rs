//! Property tests for request planning.
//!
//! 1. Quotes: one sequence per date (times ISINs when selected), dates ascending
//! 2. Schedules never depend on the date range
//! 3. Every planned request targets the base URL

use bondlab_core::domain::{DateRange, RecordKind};
use bondlab_core::fetch::Endpoints;
use bondlab_runner::plan::plan_requests;
use chrono::NaiveDate;
use proptest::prelude::*;

fn arb_range() -> impl Strategy<Value = DateRange> {
    (0i64..400, 0i64..20).prop_map(|(offset, len)| {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(offset);
        DateRange::new(start, start + chrono::Duration::days(len)).unwrap()
    })
}

fn arb_isins() -> impl Strategy<Value = Option<Vec<String>>> {
    prop::option::of(prop::collection::vec("RU[0-9A-Z]{10}", 0..6))
}

fn arb_kind() -> impl Strategy<Value = RecordKind> {
    prop::sample::select(RecordKind::ALL.to_vec())
}

proptest! {
    // ── Quotes ───────────────────────────────────────────────────────

    #[test]
    fn quote_sequences_cover_every_date_in_order(range in arb_range(), isins in arb_isins()) {
        let endpoints = Endpoints::new("http://iss");
        let (_, reqs) = plan_requests(&endpoints, RecordKind::Quote, &range, isins.as_deref());

        let per_date = isins.as_ref().map_or(1, Vec::len);
        prop_assert_eq!(reqs.len(), range.len_days() * per_date);

        let dates: Vec<&str> = reqs
            .iter()
            .map(|r| r.query.iter().find(|(k, _)| k == "date" || k == "from").map(|(_, v)| v.as_str()).unwrap())
            .collect();
        let mut sorted = dates.clone();
        sorted.sort();
        prop_assert_eq!(dates, sorted);
    }

    // ── Schedules ────────────────────────────────────────────────────

    #[test]
    fn schedules_ignore_the_date_range(a in arb_range(), b in arb_range(), isins in arb_isins()) {
        let endpoints = Endpoints::new("http://iss");
        for kind in [RecordKind::Coupon, RecordKind::Amortization, RecordKind::Offer] {
            let (_, left) = plan_requests(&endpoints, kind, &a, isins.as_deref());
            let (_, right) = plan_requests(&endpoints, kind, &b, isins.as_deref());
            prop_assert_eq!(left, right);
        }
    }

    // ── Targets ──────────────────────────────────────────────────────

    #[test]
    fn requests_stay_under_the_base_url(kind in arb_kind(), range in arb_range(), isins in arb_isins()) {
        let endpoints = Endpoints::new("http://iss/");
        let (_, reqs) = plan_requests(&endpoints, kind, &range, isins.as_deref());
        for r in &reqs {
            prop_assert!(r.url.starts_with("http://iss/"));
            prop_assert!(r.url.ends_with(".json"));
        }
    }
}
