//! Per-day cache of upstream article counts.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use crate::stats::{DayKey, ItemCount};

/// Key-value store of the article counts seen on each day.
///
/// A miss is a normal outcome and is reported as `None`, never as an error.
/// Implementations are shared between every in-flight query and must be safe
/// under concurrent use.
pub trait DayCache: Send + Sync {
    /// Stores the list for `day`, replacing any previous list.
    fn put(&self, day: DayKey, items: Vec<ItemCount>);

    /// Returns the stored list for `day`, if any.
    fn get(&self, day: DayKey) -> Option<Vec<ItemCount>>;
}

/// Unbounded in-memory cache. Entries are never evicted.
#[derive(Debug, Default)]
pub struct MemoryDayCache {
    days: RwLock<HashMap<DayKey, Vec<ItemCount>>>,
}

impl MemoryDayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.read().is_empty()
    }

    pub fn contains(&self, day: DayKey) -> bool {
        self.days.read().contains_key(&day)
    }
}

impl DayCache for MemoryDayCache {
    fn put(&self, day: DayKey, items: Vec<ItemCount>) {
        let count = items.len();
        let replaced = self.days.write().insert(day, items).is_some();
        debug!(
            action = "put",
            component = "day_cache",
            day = %day,
            item_count = count,
            replaced,
            "Cached day counts"
        );
    }

    fn get(&self, day: DayKey) -> Option<Vec<ItemCount>> {
        self.days.read().get(&day).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::Rng;
    use std::sync::Arc;
    use std::thread;

    fn day(offset: u64) -> DayKey {
        let base = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        DayKey::from(base + chrono::Days::new(offset))
    }

    #[test]
    fn miss_is_none() {
        let cache = MemoryDayCache::new();
        assert!(cache.get(day(0)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites_whole_list() {
        let cache = MemoryDayCache::new();
        cache.put(day(0), vec![ItemCount::new("a", 1), ItemCount::new("b", 2)]);
        cache.put(day(0), vec![ItemCount::new("c", 3)]);

        assert_eq!(cache.get(day(0)), Some(vec![ItemCount::new("c", 3)]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_puts_are_all_visible() {
        const DAYS: u64 = 500;
        let cache = Arc::new(MemoryDayCache::new());

        let handles: Vec<_> = (0..DAYS)
            .map(|offset| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let mut rng = rand::thread_rng();
                    let items = (0..50)
                        .map(|i| ItemCount::new(format!("{offset}-{i}"), rng.gen_range(0..100)))
                        .collect();
                    cache.put(day(offset), items);
                    // Readers run alongside other writers.
                    assert!(cache.contains(day(offset)));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), DAYS as usize);
        for offset in 0..DAYS {
            let items = cache.get(day(offset)).expect("day cached");
            assert_eq!(items.len(), 50);
            assert_eq!(items[0].name, format!("{offset}-0"));
        }
    }
}
