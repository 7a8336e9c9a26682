//! Cache size enforcement
//!
//! The janitor keeps a generation under its byte ceiling. Stores that account
//! for their bytes are measured exactly; for the rest a bounded sample of the
//! oldest entries is extrapolated to the full entry count. Eviction drops the
//! oldest half of the entries by insertion order (not true recency).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lantern_domain::Result;
use tracing::{debug, info, warn};

use crate::metrics::FetchMetrics;
use crate::ports::CacheStore;

/// Estimated size of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeEstimate {
    pub entries: usize,
    pub bytes: u64,
    /// `true` when the store reported its byte total.
    pub exact: bool,
}

/// Outcome of one [`CacheJanitor::enforce_size_limit`] sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvictionReport {
    pub estimate: SizeEstimate,
    pub evicted: usize,
    /// Deletions that errored; the sweep continued past them.
    pub failed: usize,
    /// Another sweep was already running, nothing was done.
    pub skipped: bool,
}

impl EvictionReport {
    fn skipped() -> Self {
        Self { skipped: true, ..Self::default() }
    }
}

/// Clears the sweep flag on drop, including when the sweep is cancelled.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Bounds total cache size.
#[derive(Debug)]
pub struct CacheJanitor {
    max_bytes: u64,
    sample_limit: usize,
    running: AtomicBool,
    metrics: Arc<FetchMetrics>,
}

impl CacheJanitor {
    /// Janitor for a `max_bytes` ceiling, sampling at most `sample_limit` entries.
    pub fn new(max_bytes: u64, sample_limit: usize, metrics: Arc<FetchMetrics>) -> Self {
        Self { max_bytes, sample_limit: sample_limit.max(1), running: AtomicBool::new(false), metrics }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Estimate the total body bytes held by `store`.
    pub async fn estimate_size(&self, store: &dyn CacheStore) -> Result<SizeEstimate> {
        let entries = store.len().await?;
        if let Some(bytes) = store.byte_size().await? {
            return Ok(SizeEstimate { entries, bytes, exact: true });
        }
        if entries == 0 {
            return Ok(SizeEstimate::default());
        }

        let keys = store.keys().await?;
        let mut sampled = 0u64;
        let mut sampled_bytes = 0u64;
        for key in keys.iter().take(self.sample_limit) {
            if let Some(response) = store.match_key(key).await? {
                sampled += 1;
                sampled_bytes += response.body_len();
            }
        }
        if sampled == 0 {
            return Ok(SizeEstimate { entries, bytes: 0, exact: false });
        }

        let bytes = sampled_bytes.saturating_mul(entries as u64) / sampled;
        Ok(SizeEstimate { entries, bytes, exact: false })
    }

    /// Whether an estimate is over the ceiling.
    pub fn exceeds_limit(&self, estimate: &SizeEstimate) -> bool {
        estimate.bytes > self.max_bytes
    }

    /// Evict the oldest half of `store` when it is over the ceiling.
    ///
    /// At most one sweep runs at a time; a concurrent call returns a report
    /// with `skipped` set. Failed deletions are logged and counted, they do
    /// not stop the sweep.
    pub async fn enforce_size_limit(&self, store: &dyn CacheStore) -> Result<EvictionReport> {
        if self.running.swap(true, Ordering::AcqRel) {
            debug!("size sweep already running");
            return Ok(EvictionReport::skipped());
        }
        let _guard = SweepGuard(&self.running);
        self.sweep(store).await
    }

    async fn sweep(&self, store: &dyn CacheStore) -> Result<EvictionReport> {
        let estimate = self.estimate_size(store).await?;
        if !self.exceeds_limit(&estimate) {
            return Ok(EvictionReport { estimate, ..EvictionReport::default() });
        }

        let keys = store.keys().await?;
        let to_evict = keys.len().div_ceil(2);
        let mut evicted = 0;
        let mut failed = 0;
        for key in keys.iter().take(to_evict) {
            match store.delete(key).await {
                Ok(_) => evicted += 1,
                Err(err) => {
                    failed += 1;
                    warn!(error = %err, key = %key, "eviction failed");
                }
            }
        }

        self.metrics.record_evictions(evicted as u64);
        info!(
            estimated_bytes = estimate.bytes,
            limit_bytes = self.max_bytes,
            evicted,
            failed,
            "cache size limit enforced"
        );
        Ok(EvictionReport { estimate, evicted, failed, skipped: false })
    }
}
