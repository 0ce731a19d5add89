use thiserror::Error;

use crate::stats::{DayKey, ItemCount};

/// Why one day's counts could not be obtained from the upstream provider.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unable to retrieve page count data from Wikipedia: {day_compact} ({source})", day_compact = .day.compact())]
    Request {
        day: DayKey,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unable to retrieve page count data from Wikipedia: {day_compact} (status {status})", day_compact = .day.compact())]
    Status { day: DayKey, status: u16 },

    #[error("Unable to decode page count data for {day_compact}: {source}", day_compact = .day.compact())]
    Decode {
        day: DayKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("No page count data available for {day_compact}", day_compact = .day.compact())]
    NoData { day: DayKey },

    #[error("Unable to retrieve counts for {day_compact}: {message}", day_compact = .day.compact())]
    Other { day: DayKey, message: String },
}

impl FetchError {
    pub fn other(day: DayKey, message: impl Into<String>) -> Self {
        FetchError::Other {
            day,
            message: message.into(),
        }
    }

    pub fn day(&self) -> DayKey {
        match self {
            FetchError::Request { day, .. }
            | FetchError::Status { day, .. }
            | FetchError::Decode { day, .. }
            | FetchError::NoData { day }
            | FetchError::Other { day, .. } => *day,
        }
    }
}

/// Supplies the article counts for a single day.
///
/// Called from many worker threads at once, each for a distinct day.
pub trait DataSource: Send + Sync {
    fn fetch(&self, day: DayKey) -> Result<Vec<ItemCount>, FetchError>;
}

impl<F> DataSource for F
where
    F: Fn(DayKey) -> Result<Vec<ItemCount>, FetchError> + Send + Sync,
{
    fn fetch(&self, day: DayKey) -> Result<Vec<ItemCount>, FetchError> {
        self(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn closures_act_as_sources() {
        let source = |day: DayKey| -> Result<Vec<ItemCount>, FetchError> {
            Ok(vec![ItemCount::new(day.compact(), 7)])
        };
        let day = DayKey::from(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        let items = DataSource::fetch(&source, day).unwrap();
        assert_eq!(items, vec![ItemCount::new("20220101", 7)]);
    }

    #[test]
    fn errors_name_their_day() {
        let day = DayKey::from(NaiveDate::from_ymd_opt(2001, 1, 1).unwrap());
        let err = FetchError::Status { day, status: 404 };
        assert_eq!(err.day(), day);
        assert!(err
            .to_string()
            .contains("Unable to retrieve page count data from Wikipedia: 20010101"));
    }
}
