//! Bounded TTL + LRU cache for shared candidate pools.
//!
//! One entry holds the materialized candidate list served to every
//! first-time buyer with the same normalized filters. Usage counters and
//! last-used stamps are advisory (they only steer eviction), so they are
//! relaxed atomics updated without exclusive access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::model::Question;
use crate::traits::QuestionFilter;

/// Deterministic key for a shared pool: normalized filters plus the
/// requested count and the purchase sequence number. Category and tag
/// order must not matter, so both are sorted.
pub fn cache_key(filter: &QuestionFilter, requested: usize, sequence: u32) -> String {
    let mut categories = filter.categories.clone();
    categories.sort();
    let mut tags = filter.tags.clone();
    tags.sort();
    let difficulty = filter
        .difficulty
        .map(|d| d.to_string())
        .unwrap_or_else(|| "any".to_string());
    format!(
        "{}|{}|{}|{}|{}|{}",
        filter.subject_id,
        difficulty,
        categories.join(","),
        tags.join(","),
        requested,
        sequence
    )
}

/// A materialized candidate pool with its bookkeeping.
pub struct PoolCacheEntry {
    pub questions: Arc<Vec<Question>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    uses: AtomicU64,
    last_used_ms: AtomicI64,
}

impl PoolCacheEntry {
    fn new(questions: Vec<Question>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            questions: Arc::new(questions),
            created_at: now,
            expires_at: now + ttl,
            uses: AtomicU64::new(0),
            last_used_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// Bump usage and last-used; returns the new usage count.
    pub fn touch(&self, now: DateTime<Utc>) -> u64 {
        self.last_used_ms
            .store(now.timestamp_millis(), Ordering::Relaxed);
        self.uses.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn uses(&self) -> u64 {
        self.uses.load(Ordering::Relaxed)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn last_used_ms(&self) -> i64 {
        self.last_used_ms.load(Ordering::Relaxed)
    }

    /// Rough resident size of this entry.
    fn memory_estimate(&self) -> usize {
        self.questions
            .iter()
            .map(|q| {
                std::mem::size_of::<Question>()
                    + q.prompt.len()
                    + q.options.iter().map(String::len).sum::<usize>()
                    + q.tags.iter().map(String::len).sum::<usize>()
            })
            .sum()
    }
}

/// The shared-pool cache itself. Callers own the outer lock; this type
/// only encodes capacity, TTL, and LRU policy.
pub struct SharedPoolCache {
    entries: HashMap<String, Arc<PoolCacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl SharedPoolCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            ttl,
        }
    }

    /// Live entry for `key`, if present and unexpired.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<PoolCacheEntry>> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .cloned()
    }

    /// Insert a fresh pool, evicting least-recently-used entries while
    /// over capacity.
    pub fn insert(
        &mut self,
        key: String,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Arc<PoolCacheEntry> {
        while self.entries.len() >= self.capacity {
            let Some(lru_key) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used_ms())
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            tracing::debug!(key = %lru_key, "evicting least-recently-used shared pool");
            self.entries.remove(&lru_key);
        }
        let entry = Arc::new(PoolCacheEntry::new(questions, now, self.ttl));
        self.entries.insert(key, Arc::clone(&entry));
        entry
    }

    /// Drop entries past their expiry. Returns how many were removed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn memory_estimate(&self) -> usize {
        self.entries
            .values()
            .map(|entry| entry.memory_estimate())
            .sum()
    }
}
