//! Strategy executors
//!
//! One algorithm per [`Strategy`]. Executors share the network port, the
//! fallback resolver and the janitor; the cache store of the generation being
//! served travels with each [`FetchJob`].

use std::sync::Arc;

use lantern_domain::{
    CacheKey, LanternError, Request, ResourceClass, Response, ResponseSource, Result, Strategy,
};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::fallback::FallbackResolver;
use crate::janitor::CacheJanitor;
use crate::metrics::FetchMetrics;
use crate::ports::{CacheStore, NetworkFetcher};

/// Whether a successful network response may be written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorePolicy {
    #[default]
    Store,
    /// The size guard refused caching; the store step is a no-op.
    Skip,
}

/// One request to execute against one generation.
#[derive(Clone)]
pub struct FetchJob {
    pub request: Request,
    pub class: ResourceClass,
    pub store: Arc<dyn CacheStore>,
    pub policy: StorePolicy,
}

impl FetchJob {
    /// Job that may store into `store`; use [`with_policy`](Self::with_policy) to disable that.
    pub fn new(request: Request, class: ResourceClass, store: Arc<dyn CacheStore>) -> Self {
        Self { request, class, store, policy: StorePolicy::Store }
    }

    pub fn with_policy(mut self, policy: StorePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn key(&self) -> Option<CacheKey> {
        CacheKey::for_request(&self.request)
    }
}

/// Runs caching strategies.
///
/// Cheap to clone; clones share the background task tracker, so
/// [`settle`](Self::settle) waits for revalidations started by any clone.
#[derive(Clone)]
pub struct StrategyExecutor {
    network: Arc<dyn NetworkFetcher>,
    fallback: Arc<FallbackResolver>,
    janitor: Arc<CacheJanitor>,
    metrics: Arc<FetchMetrics>,
    tasks: TaskTracker,
}

impl StrategyExecutor {
    /// Executor sharing `metrics` with the janitor and the manager.
    pub fn new(
        network: Arc<dyn NetworkFetcher>,
        fallback: Arc<FallbackResolver>,
        janitor: Arc<CacheJanitor>,
        metrics: Arc<FetchMetrics>,
    ) -> Self {
        Self { network, fallback, janitor, metrics, tasks: TaskTracker::new() }
    }

    /// Counters updated by every executor.
    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    /// Run `strategy` for `job`.
    ///
    /// # Errors
    /// - `LanternError::CacheMiss` from cache-only when nothing is stored.
    /// - `LanternError::Network` from network-only, and from
    ///   stale-while-revalidate when there is neither a cached entry nor a
    ///   network response.
    pub async fn execute(&self, strategy: Strategy, job: &FetchJob) -> Result<Response> {
        debug!(url = %job.request.url(), class = %job.class, strategy = %strategy, "executing strategy");
        match strategy {
            Strategy::CacheFirst => Ok(self.cache_first(job).await),
            Strategy::NetworkFirst => Ok(self.network_first(job).await),
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(job).await,
            Strategy::CacheOnly => self.cache_only(job).await,
            Strategy::NetworkOnly => self.network_only(job).await,
        }
    }

    /// Cached entry if present, else network (stored when ok), else fallback.
    pub async fn cache_first(&self, job: &FetchJob) -> Response {
        if let Some(cached) = self.lookup(job).await {
            return cached;
        }
        match self.fetch(&job.request).await {
            Ok(response) => {
                self.store_copy(job, &response).await;
                response
            }
            Err(_) => self.fallback(job).await,
        }
    }

    /// Network (stored when ok), else cached entry, else fallback.
    pub async fn network_first(&self, job: &FetchJob) -> Response {
        match self.fetch(&job.request).await {
            Ok(response) => {
                self.store_copy(job, &response).await;
                response
            }
            Err(_) => match self.lookup(job).await {
                Some(cached) => cached,
                None => self.fallback(job).await,
            },
        }
    }

    /// Cached entry right away with a detached refresh, or the network result
    /// when nothing is cached.
    pub async fn stale_while_revalidate(&self, job: &FetchJob) -> Result<Response> {
        if let Some(cached) = self.lookup(job).await {
            self.spawn_revalidation(job.clone());
            return Ok(cached);
        }
        let response = self.fetch(&job.request).await?;
        self.store_copy(job, &response).await;
        Ok(response)
    }

    /// Cached entry or `CacheMiss`. Never touches the network.
    pub async fn cache_only(&self, job: &FetchJob) -> Result<Response> {
        self.lookup(job)
            .await
            .ok_or_else(|| LanternError::CacheMiss(job.request.url().to_string()))
    }

    /// Network response as is; errors propagate and nothing is stored.
    pub async fn network_only(&self, job: &FetchJob) -> Result<Response> {
        self.fetch(&job.request).await
    }

    /// Cached entry for the job's request, if any. Store errors count as a
    /// miss.
    pub async fn lookup(&self, job: &FetchJob) -> Option<Response> {
        let key = job.key()?;
        match job.store.match_key(&key).await {
            Ok(Some(response)) => {
                self.metrics.record_hit();
                Some(response.with_source(ResponseSource::Cache))
            }
            Ok(None) => {
                self.metrics.record_miss();
                None
            }
            Err(err) => {
                self.metrics.record_miss();
                warn!(error = %err, key = %key, "cache lookup failed");
                None
            }
        }
    }

    /// Fallback response for the job.
    pub async fn fallback(&self, job: &FetchJob) -> Response {
        self.metrics.record_fallback();
        self.fallback.resolve(&job.request, job.class, job.store.as_ref()).await
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Run the janitor on `store` as a detached task.
    pub fn spawn_size_enforcement(&self, store: Arc<dyn CacheStore>) {
        let janitor = Arc::clone(&self.janitor);
        self.tasks.spawn(async move {
            if let Err(err) = janitor.enforce_size_limit(store.as_ref()).await {
                warn!(error = %err, "background size enforcement failed");
            }
        });
    }

    fn spawn_revalidation(&self, job: FetchJob) {
        let executor = self.clone();
        self.tasks.spawn(async move {
            match executor.fetch(&job.request).await {
                Ok(response) => {
                    executor.store_copy(&job, &response).await;
                    executor.metrics.record_revalidation();
                    debug!(url = %job.request.url(), status = response.status, "revalidated");
                }
                Err(err) => debug!(url = %job.request.url(), error = %err, "revalidation failed"),
            }
        });
    }

    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.metrics.record_network_fetch();
        match self.network.fetch(request).await {
            Ok(response) => Ok(response.with_source(ResponseSource::Network)),
            Err(err) => {
                self.metrics.record_network_failure();
                debug!(url = %request.url(), error = %err, "network fetch failed");
                Err(err)
            }
        }
    }

    async fn store_copy(&self, job: &FetchJob, response: &Response) {
        if !response.is_ok() {
            return;
        }
        let Some(key) = job.key() else {
            return;
        };
        if job.policy == StorePolicy::Skip {
            self.metrics.record_store_skipped();
            debug!(key = %key, "store skipped by size guard");
            return;
        }
        if job.class.is_size_guarded() {
            if let Err(err) = self.janitor.enforce_size_limit(job.store.as_ref()).await {
                warn!(error = %err, "size enforcement failed");
            }
        }
        if let Err(err) = job.store.put(key.clone(), response.clone()).await {
            warn!(error = %err, key = %key, "cache write failed");
        }
    }
}
