//! Memoization of keyword-in-context query results

use crate::{kwic::KwicRow, Keyword, Year};
use lru::LruCache;
use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

/// Maximum number of memoized query results
const CAPACITY: usize = 32;

/// Key of a memoized query: the keyword and the selected years exactly as the
/// page sent them, duplicates included
pub type QueryKey = (Keyword, Box<[Year]>);

/// Bounded memoization of query results, with least-recently-used eviction
pub struct QueryCache {
    /// Memoized query results
    results: Mutex<LruCache<QueryKey, Arc<[KwicRow]>>>,

    /// Number of lookups answered from memory
    hits: AtomicU64,

    /// Number of lookups that had to go to the database
    misses: AtomicU64,
}
//
impl QueryCache {
    /// Set up the cache
    pub fn new() -> Self {
        Self {
            results: Mutex::new(LruCache::new(
                NonZeroUsize::new(CAPACITY).expect("the cache capacity should be nonzero"),
            )),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a memoized result
    pub fn get(&self, key: &QueryKey) -> Option<Arc<[KwicRow]>> {
        let mut results = self
            .results
            .lock()
            .expect("no panics while holding the cache lock");
        let result = results.get(key).cloned();
        match &result {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    /// Memoize a query result, evicting the least recently used one if full
    pub fn insert(&self, key: QueryKey, rows: Arc<[KwicRow]>) {
        let mut results = self
            .results
            .lock()
            .expect("no panics while holding the cache lock");
        if let Some((evicted, _rows)) = results.push(key, rows) {
            log::trace!("evicted memoized KWIC rows for {evicted:?}");
        }
    }

    /// Number of lookups answered from memory vs from the database
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(keyword: &str, years: &[Year]) -> QueryKey {
        (keyword.into(), years.into())
    }

    fn rows(file: &str) -> Arc<[KwicRow]> {
        Arc::from(vec![KwicRow {
            file: file.into(),
            year: 1700,
            context: "om adel och borgare".into(),
        }])
    }

    #[test]
    fn memoizes_and_counts() {
        let cache = QueryCache::new();
        let key = key("adel", &[1700, 1701]);
        assert_eq!(cache.get(&key), None);
        cache.insert(key.clone(), rows("a.txt"));
        assert_eq!(cache.get(&key), Some(rows("a.txt")));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn duplicate_years_are_distinct_keys() {
        let cache = QueryCache::new();
        cache.insert(key("adel", &[1700, 1700]), rows("a.txt"));
        assert_eq!(cache.get(&key("adel", &[1700])), None);
        assert_eq!(
            cache.get(&key("adel", &[1700, 1700])),
            Some(rows("a.txt"))
        );
    }

    #[test]
    fn year_order_is_part_of_the_key() {
        let cache = QueryCache::new();
        cache.insert(key("adel", &[1701, 1700]), rows("a.txt"));
        assert_eq!(cache.get(&key("adel", &[1700, 1701])), None);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let cache = QueryCache::new();
        for i in 0..=CAPACITY {
            cache.insert(key(&format!("k{i}"), &[]), rows("a.txt"));
        }
        // The first key went over the edge, the second one is still there
        assert_eq!(cache.get(&key("k0", &[])), None);
        assert!(cache.get(&key("k1", &[])).is_some());
    }

    #[test]
    fn lookups_refresh_the_eviction_order() {
        let cache = QueryCache::new();
        for i in 0..CAPACITY {
            cache.insert(key(&format!("k{i}"), &[]), rows("a.txt"));
        }
        assert!(cache.get(&key("k0", &[])).is_some());
        cache.insert(key("one-over", &[]), rows("b.txt"));
        // k1 was the least recently used entry, k0 got refreshed above
        assert!(cache.get(&key("k0", &[])).is_some());
        assert_eq!(cache.get(&key("k1", &[])), None);
    }
}
