//! Reporting windows for period counts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format of `qr_requests.created_at` as written by `CURRENT_TIMESTAMP`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Window a period count is taken over.
///
/// `Today` starts at UTC midnight; `Month` and `Year` are rolling windows of
/// 30 and 365 days ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Today,
    Month,
    Year,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Inclusive lower bound of the window, relative to `now`.
    pub fn cutoff(self, now: DateTime<Utc>) -> NaiveDateTime {
        let now = now.naive_utc();
        match self {
            Self::Today => now.date().and_time(chrono::NaiveTime::MIN),
            Self::Month => now - Duration::days(30),
            Self::Year => now - Duration::days(365),
        }
    }

    /// Calendar dates spanned by the window (`period_start`, `period_end`).
    pub fn span(self, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        (self.cutoff(now).date(), now.date_naive())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown timeframe: {0}")]
pub struct UnknownTimeframe(pub String);

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(UnknownTimeframe(other.to_string())),
        }
    }
}
