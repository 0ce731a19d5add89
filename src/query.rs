use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::aggregator::{AggregateError, Aggregator, MergePolicy};
use crate::cache::DayCache;
use crate::source::DataSource;
use crate::stats::{month_bounds, DateRangeResult, DayKey};

/// Entry points for the three view-count queries.
///
/// Dates are trusted: range ordering and length are checked by the caller
/// (see [`crate::validate`]).
pub struct QueryEngine {
    aggregator: Aggregator,
}

impl QueryEngine {
    pub fn new(source: Arc<dyn DataSource>, cache: Arc<dyn DayCache>) -> Self {
        Self {
            aggregator: Aggregator::new(source, cache),
        }
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.aggregator = self.aggregator.with_workers(workers);
        self
    }

    pub fn cache(&self) -> &Arc<dyn DayCache> {
        self.aggregator.cache()
    }

    /// Every article seen in `start..=end`, by total views descending.
    pub fn range_ranking(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, AggregateError> {
        self.execute(start, end, MergePolicy::SumAll)
    }

    /// Total views of `name` over `start..=end`. Empty if it never appeared.
    pub fn item_total(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, AggregateError> {
        self.execute(start, end, MergePolicy::SumFiltered(name.to_string()))
    }

    /// The day in `start..=end` on which `name` had the most views.
    pub fn best_day_for_item(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, AggregateError> {
        self.execute(start, end, MergePolicy::MaxSingleDay(name.to_string()))
    }

    /// Best day for `name` within the calendar month containing `month`.
    pub fn best_day_in_month(
        &self,
        name: &str,
        month: NaiveDate,
    ) -> Result<DateRangeResult, AggregateError> {
        let (first, last) = month_bounds(month);
        self.best_day_for_item(name, first, last)
    }

    fn execute(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        policy: MergePolicy,
    ) -> Result<DateRangeResult, AggregateError> {
        let start_time = Instant::now();
        let days = DayKey::range_inclusive(start, end);
        let index = self.aggregator.run(&days, &policy)?;

        let items = index
            .extract_ordered()
            .into_iter()
            .map(|entry| entry.payload)
            .collect::<Vec<_>>();

        info!(
            action = "complete",
            component = "query",
            start = %start,
            end = %end,
            article = policy.target().unwrap_or("*"),
            item_count = items.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Query completed"
        );

        Ok(DateRangeResult { start, end, items })
    }
}
