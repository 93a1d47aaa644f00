//! ISS endpoint templates.
//!
//! Every logical request the pipeline issues is described by a
//! [`FetchRequest`]: the URL, the fixed query parameters, the block the
//! response is expected to carry and whether the endpoint pages.

use super::envelope::BlockLayout;
use super::source::Query;
use crate::domain::RecordKind;
use chrono::NaiveDate;

/// One logical request, possibly spanning several pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Fixed query parameters. `start`/`limit` are added by the page stream.
    pub query: Query,
    pub block: &'static str,
    pub layout: BlockLayout,
    /// Whether `start`/`limit` are sent and the cursor is followed.
    pub paginated: bool,
    /// Short human-readable identification for logs and summaries.
    pub label: String,
}

/// Builds [`FetchRequest`]s against one ISS base URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Paginated listing of every bond on the market.
    pub fn securities_all(&self) -> FetchRequest {
        FetchRequest {
            url: format!("{}/engines/stock/markets/bonds/securities.json", self.base_url),
            query: Vec::new(),
            block: "securities",
            layout: BlockLayout::Rows,
            paginated: true,
            label: "securities".into(),
        }
    }

    /// One-shot description lookup for a single bond.
    pub fn security_by_isin(&self, isin: &str) -> FetchRequest {
        FetchRequest {
            url: format!(
                "{}/engines/stock/markets/bonds/securities/{isin}.json",
                self.base_url
            ),
            query: Vec::new(),
            block: "description",
            layout: BlockLayout::NameValue,
            paginated: false,
            label: format!("security {isin}"),
        }
    }

    /// Trading results of every bond on one date.
    pub fn quotes_all(&self, date: NaiveDate) -> FetchRequest {
        FetchRequest {
            url: format!(
                "{}/history/engines/stock/markets/bonds/securities.json",
                self.base_url
            ),
            query: vec![("date".into(), date.to_string())],
            block: "history",
            layout: BlockLayout::Rows,
            paginated: true,
            label: format!("quotes {date}"),
        }
    }

    /// Trading results of one bond on one date.
    pub fn quotes_by_isin(&self, isin: &str, date: NaiveDate) -> FetchRequest {
        FetchRequest {
            url: format!(
                "{}/history/engines/stock/markets/bonds/securities/{isin}.json",
                self.base_url
            ),
            query: vec![
                ("from".into(), date.to_string()),
                ("till".into(), date.to_string()),
            ],
            block: "history",
            layout: BlockLayout::Rows,
            paginated: true,
            label: format!("quotes {isin} {date}"),
        }
    }

    /// Global coupon, amortization or offer schedule.
    pub fn schedules_all(&self, kind: RecordKind) -> Option<FetchRequest> {
        let block = schedule_block(kind)?;
        Some(FetchRequest {
            url: format!(
                "{}/statistics/engines/stock/markets/bonds/bondization.json",
                self.base_url
            ),
            query: Vec::new(),
            block,
            layout: BlockLayout::Rows,
            paginated: true,
            label: block.to_string(),
        })
    }

    /// Coupon, amortization or offer schedule of one bond.
    pub fn schedules_by_isin(&self, kind: RecordKind, isin: &str) -> Option<FetchRequest> {
        let block = schedule_block(kind)?;
        Some(FetchRequest {
            url: format!(
                "{}/statistics/engines/stock/markets/bonds/bondization/{isin}.json",
                self.base_url
            ),
            query: Vec::new(),
            block,
            layout: BlockLayout::Rows,
            paginated: true,
            label: format!("{block} {isin}"),
        })
    }
}

/// Response block carrying a schedule kind's rows.
pub fn schedule_block(kind: RecordKind) -> Option<&'static str> {
    match kind {
        RecordKind::Coupon => Some("coupons"),
        RecordKind::Amortization => Some("amortizations"),
        RecordKind::Offer => Some("offers"),
        RecordKind::Security | RecordKind::Quote => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://iss.moex.com/iss/")
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(endpoints().base_url(), "https://iss.moex.com/iss");
    }

    #[test]
    fn security_lookup_is_one_shot_description() {
        let req = endpoints().security_by_isin("RU000A1038V6");
        assert_eq!(
            req.url,
            "https://iss.moex.com/iss/engines/stock/markets/bonds/securities/RU000A1038V6.json"
        );
        assert_eq!(req.block, "description");
        assert_eq!(req.layout, BlockLayout::NameValue);
        assert!(!req.paginated);
    }

    #[test]
    fn quotes_by_isin_scopes_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let req = endpoints().quotes_by_isin("SU26238RMFS4", date);
        assert_eq!(
            req.query,
            vec![
                ("from".to_string(), "2024-01-03".to_string()),
                ("till".to_string(), "2024-01-03".to_string())
            ]
        );
        assert_eq!(req.block, "history");
    }

    #[test]
    fn quotes_all_uses_date_param() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let req = endpoints().quotes_all(date);
        assert!(req.url.ends_with("/history/engines/stock/markets/bonds/securities.json"));
        assert_eq!(req.query, vec![("date".to_string(), "2024-01-03".to_string())]);
        assert!(req.paginated);
    }

    #[test]
    fn schedule_blocks_follow_kind() {
        let e = endpoints();
        assert_eq!(e.schedules_all(RecordKind::Coupon).unwrap().block, "coupons");
        assert_eq!(
            e.schedules_by_isin(RecordKind::Offer, "X").unwrap().url,
            "https://iss.moex.com/iss/statistics/engines/stock/markets/bonds/bondization/X.json"
        );
        assert!(e.schedules_all(RecordKind::Quote).is_none());
    }
}
