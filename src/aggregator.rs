use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::DayCache;
use crate::ranked::RankedIndex;
use crate::source::{DataSource, FetchError};
use crate::stats::{DayKey, ItemCount};

#[derive(Error, Debug)]
pub enum AggregateError {
    /// Every day that could not be resolved, ordered by day.
    #[error("{}", join_messages(.0))]
    DaysFailed(Vec<FetchError>),

    #[error("Failed to start day workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl AggregateError {
    pub fn failed_days(&self) -> Vec<DayKey> {
        match self {
            AggregateError::DaysFailed(failures) => failures.iter().map(FetchError::day).collect(),
            AggregateError::Pool(_) => Vec::new(),
        }
    }
}

fn join_messages(failures: &[FetchError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// How one day's counts are folded into the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePolicy {
    /// Sum views of every article.
    SumAll,
    /// Sum views of the named article only.
    SumFiltered(String),
    /// Keep the named article's highest single-day views and the day they
    /// occurred on. The earliest day wins ties.
    MaxSingleDay(String),
}

impl MergePolicy {
    pub fn target(&self) -> Option<&str> {
        match self {
            MergePolicy::SumAll => None,
            MergePolicy::SumFiltered(name) | MergePolicy::MaxSingleDay(name) => Some(name.as_str()),
        }
    }

    pub fn merge(&self, index: &mut RankedIndex<ItemCount>, day: DayKey, items: &[ItemCount]) {
        match self {
            MergePolicy::SumAll => {
                for item in items {
                    add_views(index, item);
                }
            }
            MergePolicy::SumFiltered(target) => {
                for item in items.iter().filter(|item| item.name == *target) {
                    add_views(index, item);
                }
            }
            MergePolicy::MaxSingleDay(target) => {
                for item in items.iter().filter(|item| item.name == *target) {
                    keep_best_day(index, day, item);
                }
            }
        }
    }
}

fn add_views(index: &mut RankedIndex<ItemCount>, item: &ItemCount) {
    let total = index
        .get(&item.name)
        .map_or(0, |entry| entry.score)
        .saturating_add(item.views);
    index.upsert(item.name.clone(), total, ItemCount::new(item.name.clone(), total));
}

fn keep_best_day(index: &mut RankedIndex<ItemCount>, day: DayKey, item: &ItemCount) {
    // Days merge in completion order, so an equal count only replaces the
    // current best when it comes from an earlier day.
    let replace = match index.get(&item.name) {
        None => true,
        Some(best) => {
            item.views > best.score
                || (item.views == best.score
                    && best.payload.day.is_some_and(|best_day| day.date() < best_day))
        }
    };
    if replace {
        index.upsert(
            item.name.clone(),
            item.views,
            ItemCount::new(item.name.clone(), item.views).observed_on(day),
        );
    }
}

/// Default number of fetch workers when no cap is configured.
pub const DEFAULT_WORKERS: usize = 100;

/// Resolves each day through the cache or the data source and merges the
/// results into a fresh ranking.
///
/// Cache hits merge on the calling thread. Misses are fetched on a worker pool
/// that is built on first use and reused by every later run.
pub struct Aggregator {
    source: Arc<dyn DataSource>,
    cache: Arc<dyn DayCache>,
    workers: Option<usize>,
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn DataSource>, cache: Arc<dyn DayCache>) -> Self {
        Self {
            source,
            cache,
            workers: None,
            pool: Mutex::new(None),
        }
    }

    /// Caps the number of days fetched at once. `None` uses
    /// [`DEFAULT_WORKERS`].
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        *self.pool.get_mut() = None;
        self
    }

    pub fn cache(&self) -> &Arc<dyn DayCache> {
        &self.cache
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS).max(1)
    }

    /// Fails if any day fails; the partial ranking is discarded.
    pub fn run(
        &self,
        days: &[DayKey],
        policy: &MergePolicy,
    ) -> Result<RankedIndex<ItemCount>, AggregateError> {
        let start_time = Instant::now();
        if days.is_empty() {
            return Ok(RankedIndex::new());
        }

        let mut index = RankedIndex::new();
        let mut misses = Vec::new();
        for &day in days {
            match self.cache.get(day) {
                Some(items) => policy.merge(&mut index, day, &items),
                None => misses.push(day),
            }
        }
        let cache_hits = days.len() - misses.len();
        info!(
            action = "start",
            component = "aggregator",
            day_count = days.len(),
            cache_hits,
            policy = ?policy,
            "Aggregating day counts"
        );

        let mut failures = if misses.is_empty() {
            Vec::new()
        } else {
            self.fetch_misses(&misses, policy, &mut index)?
        };

        if !failures.is_empty() {
            failures.sort_by_key(FetchError::day);
            error!(
                action = "complete",
                component = "aggregator",
                failed_days = failures.len(),
                day_count = days.len(),
                duration_ms = start_time.elapsed().as_millis(),
                "Aggregation failed"
            );
            return Err(AggregateError::DaysFailed(failures));
        }

        info!(
            action = "complete",
            component = "aggregator",
            day_count = days.len(),
            cache_hits,
            ranked_items = index.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Aggregation completed"
        );
        Ok(index)
    }

    /// Fetches every missed day on the pool, one task per day, and merges the
    /// successes into `index`. Returns the failures.
    fn fetch_misses(
        &self,
        misses: &[DayKey],
        policy: &MergePolicy,
        index: &mut RankedIndex<ItemCount>,
    ) -> Result<Vec<FetchError>, AggregateError> {
        let pool = self.pool()?;
        let shared = Mutex::new(std::mem::take(index));
        let failures = Mutex::new(Vec::new());

        pool.scope(|scope| {
            for &day in misses {
                let shared = &shared;
                let failures = &failures;
                scope.spawn(move |_| match self.fetch(day) {
                    Ok(items) => policy.merge(&mut shared.lock(), day, &items),
                    Err(err) => {
                        warn!(
                            action = "fetch",
                            component = "aggregator",
                            day = %day,
                            error = %err,
                            "Day failed"
                        );
                        failures.lock().push(err);
                    }
                });
            }
        });

        *index = shared.into_inner();
        Ok(failures.into_inner())
    }

    fn pool(&self) -> Result<Arc<ThreadPool>, AggregateError> {
        let mut slot = self.pool.lock();
        if let Some(pool) = slot.as_ref() {
            return Ok(Arc::clone(pool));
        }

        let width = self.worker_count();
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(width)
                .thread_name(|i| format!("topviews-day-{i}"))
                .build()?,
        );
        info!(
            action = "start_pool",
            component = "aggregator",
            worker_count = width,
            "Started fetch workers"
        );
        *slot = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Fetches from the source and stores the result in the cache.
    fn fetch(&self, day: DayKey) -> Result<Vec<ItemCount>, FetchError> {
        let items = self.source.fetch(day)?;
        self.cache.put(day, items.clone());
        Ok(items)
    }
}
