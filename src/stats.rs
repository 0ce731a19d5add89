use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar day, the identity key of the day cache.
///
/// Every timestamp falling on the same date converts to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Every day from `start` to `end`, both included, in ascending order.
    pub fn range_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<DayKey> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(DayKey)
            .collect()
    }

    /// Compact `YYYYMMDD` form used in upstream error messages.
    pub fn compact(self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(date)
    }
}

impl From<NaiveDateTime> for DayKey {
    fn from(timestamp: NaiveDateTime) -> Self {
        DayKey(timestamp.date())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DayKey {
    fn from(timestamp: DateTime<Tz>) -> Self {
        DayKey(timestamp.date_naive())
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date - Days::new(u64::from(date.day0()));
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

/// Views of one article, either for a single day or accumulated over a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub name: String,
    pub views: u64,
    /// Day the views were observed on; only set for best-day results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<NaiveDate>,
}

impl ItemCount {
    pub fn new(name: impl Into<String>, views: u64) -> Self {
        Self {
            name: name.into(),
            views,
            day: None,
        }
    }

    pub fn observed_on(mut self, day: DayKey) -> Self {
        self.day = Some(day.date());
        self
    }
}

/// Articles aggregated over the inclusive range `start..=end`, ordered by
/// descending views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeResult {
    #[serde(rename = "startdate")]
    pub start: NaiveDate,
    #[serde(rename = "enddate")]
    pub end: NaiveDate,
    #[serde(rename = "articles")]
    pub items: Vec<ItemCount>,
}

impl DateRangeResult {
    pub fn total_views(&self) -> u64 {
        self.items.iter().map(|item| item.views).sum()
    }
}
