//! Fetch handling statistics

use serde::{Deserialize, Serialize};

/// Snapshot of the fetch counters of one cache manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    /// Requests answered from the cache store
    pub cache_hits: u64,
    /// Cache lookups that found nothing
    pub cache_misses: u64,
    /// Network fetches issued, including background revalidations
    pub network_fetches: u64,
    /// Network fetches that produced no response
    pub network_failures: u64,
    /// Synthesized or offline-page responses
    pub fallbacks: u64,
    /// Requests refused by the security filter
    pub forbidden: u64,
    /// Responses not stored because of the cache-size guard
    pub stores_skipped: u64,
    /// Background revalidations that refreshed an entry
    pub revalidations: u64,
    /// Entries removed by the janitor
    pub evictions: u64,
    /// Entries currently in the active generation
    pub entries: usize,
}

impl FetchStats {
    /// Calculate hit rate (hits / total lookups)
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
