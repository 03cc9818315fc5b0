//! In-memory TTL cache for recommendation responses.
//!
//! Entries are keyed by a typed [`CacheKey`] variant per request type, so two
//! structurally equal requests always resolve to the same entry regardless of
//! how their parameters were assembled. Reads past the TTL behave as a miss;
//! the stale entry stays in place until the next `put` overwrites it. There is
//! no size bound: the key space (users × diet ids) is small relative to
//! process lifetime.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::recipes::types::Diet;
use crate::recommendations::dto::{PersonalizedRequest, RecommendationRecord};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Similar { diet_id: String, count: usize },
    Popular { count: usize },
    Personalized(PersonalizedRequest),
}

/// Payloads the cache holds: mapped diets for similar/popular, the raw
/// engine response for personalized (enrichment happens after the cache).
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Diets(Vec<Diet>),
    Records(Vec<RecommendationRecord>),
}

struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
}

pub struct RecommendationCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for RecommendationCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl RecommendationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the stored payload if present and younger than the TTL.
    /// Does not evict on read.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(?key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(?key, "cache expired");
                None
            }
            None => {
                debug!(?key, "cache miss");
                None
            }
        }
    }

    /// Unconditionally overwrites any entry for `key` with a fresh timestamp.
    pub async fn put(&self, key: CacheKey, value: CachedValue) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn clear_one(&self, key: &CacheKey) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear_all(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        debug!(removed = count, "cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let total = entries.len();
        let expired = entries
            .values()
            .filter(|e| e.stored_at.elapsed() >= self.ttl)
            .count();
        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}
