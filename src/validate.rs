//! Checks applied to user input before a query reaches the engine.

use chrono::NaiveDate;
use thiserror::Error;

/// `YYYYMMDD`, the layout of every date argument.
pub const DATE_LAYOUT: &str = "%Y%m%d";

/// Largest accepted gap between start and end dates, in days (exclusive).
pub const MAX_DAY_INTERVAL: i64 = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Bad {field} value: {value:?} (expected YYYYMMDD)")]
    BadDate { field: &'static str, value: String },

    #[error("End date cannot be before start date")]
    EndBeforeStart,

    #[error("Maximum interval between dates is: {max} days")]
    IntervalTooLong { max: i64 },

    #[error("Article name not found")]
    MissingArticle,

    #[error("Bad date params. Format should be a 4-digit year and 2-digit month, e.g. 2022 01")]
    BadMonth,
}

pub fn parse_day(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let bad = || ValidationError::BadDate {
        field,
        value: value.to_string(),
    };
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    NaiveDate::parse_from_str(value, DATE_LAYOUT).map_err(|_| bad())
}

/// Parses both bounds and enforces ordering and `max_days`.
pub fn validate_range(
    start: &str,
    end: &str,
    max_days: i64,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let start = parse_day("startdate", start)?;
    let end = parse_day("enddate", end)?;

    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }
    if (end - start).num_days() >= max_days {
        return Err(ValidationError::IntervalTooLong { max: max_days });
    }
    Ok((start, end))
}

/// Rejects an empty name. Titles are otherwise passed through untouched.
pub fn validate_article(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingArticle);
    }
    Ok(name)
}

/// First day of the month named by a 4-digit year and 2-digit month.
pub fn parse_month(year: &str, month: &str) -> Result<NaiveDate, ValidationError> {
    if year.len() != 4 || month.len() != 2 {
        return Err(ValidationError::BadMonth);
    }
    NaiveDate::parse_from_str(&format!("{year}{month}01"), DATE_LAYOUT)
        .map_err(|_| ValidationError::BadMonth)
}
