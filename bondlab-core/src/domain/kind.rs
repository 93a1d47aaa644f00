use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five categories of bond data the collector knows how to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Bond reference data (one row per security).
    Security,
    /// Daily trading history.
    Quote,
    /// Coupon payment schedule.
    Coupon,
    /// Amortization schedule.
    Amortization,
    /// Put/call offer schedule.
    Offer,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Security,
        RecordKind::Quote,
        RecordKind::Coupon,
        RecordKind::Amortization,
        RecordKind::Offer,
    ];

    /// Canonical configuration key for this kind.
    pub fn key(self) -> &'static str {
        match self {
            RecordKind::Security => "security",
            RecordKind::Quote => "quote",
            RecordKind::Coupon => "coupon",
            RecordKind::Amortization => "amortization",
            RecordKind::Offer => "offer",
        }
    }

    /// Legacy table key used by older collector configs and scripts.
    pub fn legacy_key(self) -> &'static str {
        match self {
            RecordKind::Security => "bonds",
            RecordKind::Quote => "quotas",
            RecordKind::Coupon => "coupons",
            RecordKind::Amortization => "amortizations",
            RecordKind::Offer => "offers",
        }
    }

    /// Whether data for this kind is fetched once per trading date.
    pub fn is_date_scoped(self) -> bool {
        matches!(self, RecordKind::Quote)
    }

    /// Whether this kind is one of the bondization schedules.
    pub fn is_schedule(self) -> bool {
        matches!(
            self,
            RecordKind::Coupon | RecordKind::Amortization | RecordKind::Offer
        )
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        RecordKind::ALL
            .into_iter()
            .find(|k| k.key() == needle || k.legacy_key() == needle)
            .ok_or_else(|| {
                format!(
                    "unknown record kind '{s}'. Valid: security, quote, coupon, amortization, offer"
                )
            })
    }
}

/// Run-level policy for what happens to the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Truncate the table and stop; nothing is fetched.
    Clear,
    /// Append new rows, skipping ones already present.
    #[default]
    Update,
    /// Truncate the table, then run a full fetch-and-load.
    Overwrite,
}

impl Mode {
    pub fn truncates(self) -> bool {
        matches!(self, Mode::Clear | Mode::Overwrite)
    }

    pub fn fetches(self) -> bool {
        !matches!(self, Mode::Clear)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Clear => "clear",
            Mode::Update => "update",
            Mode::Overwrite => "overwrite",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(Mode::Clear),
            "update" => Ok(Mode::Update),
            "overwrite" => Ok(Mode::Overwrite),
            other => Err(format!("unknown mode '{other}'. Valid: clear, update, overwrite")),
        }
    }
}
