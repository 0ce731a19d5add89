pub mod aggregator;
pub mod app;
pub mod args;
pub mod cache;
pub mod query;
pub mod ranked;
pub mod source;
pub mod stats;
pub mod utils;
pub mod validate;
pub mod wikipedia;

pub use aggregator::{AggregateError, Aggregator, MergePolicy};
pub use args::Args;
pub use cache::{DayCache, MemoryDayCache};
pub use query::QueryEngine;
pub use ranked::{RankEntry, RankedIndex};
pub use source::{DataSource, FetchError};
pub use stats::{DateRangeResult, DayKey, ItemCount};
