//! Offline cache manager
//!
//! The context object tying the selector, security filter, executors,
//! janitor and lifecycle together. Host adapters call its methods for each
//! event they receive.

use std::sync::Arc;

use lantern_domain::constants::FORBIDDEN_BODY;
use lantern_domain::{
    CacheKey, Config, ControlMessage, ControlReply, FetchStats, LanternError, LifecycleState,
    Method, Request, Response, Result, SecurityEvent, SecurityVerdict, Strategy,
};
use tracing::{debug, info, warn};

use crate::fallback::FallbackResolver;
use crate::janitor::CacheJanitor;
use crate::lifecycle::{ActivationOutcome, InstallOutcome, LifecycleManager};
use crate::metrics::FetchMetrics;
use crate::ports::{CacheStorage, CacheStore, Clients, NetworkFetcher};
use crate::security::{SecurityEventLog, SecurityFilter};
use crate::selector::StrategySelector;
use crate::strategy::{FetchJob, StorePolicy, StrategyExecutor};

enum Route {
    Forbidden(Response),
    Run(Strategy, FetchJob),
}

/// Offline cache manager for one generation.
pub struct CacheManager {
    selector: StrategySelector,
    security: SecurityFilter,
    executor: StrategyExecutor,
    janitor: Arc<CacheJanitor>,
    lifecycle: LifecycleManager,
    metrics: Arc<FetchMetrics>,
}

impl CacheManager {
    /// Build a manager for the generation named by `config.cache.version`.
    ///
    /// # Errors
    /// Returns `LanternError::Config` when the configuration does not
    /// validate.
    pub fn new(
        config: &Config,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn NetworkFetcher>,
        clients: Arc<dyn Clients>,
    ) -> Result<Self> {
        config.validate()?;

        let app_origin = config.app_origin()?;
        let offline_key = app_origin
            .join(&config.cache.offline_url)
            .ok()
            .and_then(|url| CacheKey::get(url.as_str()).ok());

        let metrics = Arc::new(FetchMetrics::new());
        let janitor = Arc::new(CacheJanitor::new(
            config.cache.max_cache_bytes,
            config.cache.size_sample_limit,
            Arc::clone(&metrics),
        ));
        let events = Arc::new(SecurityEventLog::new(config.security.event_log_capacity));
        let executor = StrategyExecutor::new(
            Arc::clone(&network),
            Arc::new(FallbackResolver::new(offline_key)),
            Arc::clone(&janitor),
            Arc::clone(&metrics),
        );

        Ok(Self {
            selector: StrategySelector::new(config.strategies.clone()),
            security: SecurityFilter::new(config, events),
            executor,
            janitor,
            lifecycle: LifecycleManager::new(config, storage, network, clients)?,
            metrics,
        })
    }

    /// Version of the managed generation.
    pub fn version(&self) -> &str {
        self.lifecycle.version()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn security(&self) -> &SecurityFilter {
        &self.security
    }

    pub fn janitor(&self) -> &CacheJanitor {
        &self.janitor
    }

    /// Store of the active generation.
    pub fn active_store(&self) -> Option<Arc<dyn CacheStore>> {
        self.lifecycle.active_store()
    }

    /// Install the generation. See [`LifecycleManager::install`].
    pub async fn install(&self) -> Result<InstallOutcome> {
        self.lifecycle.install().await
    }

    /// Activate the installed generation. See [`LifecycleManager::activate`].
    pub async fn activate(&self) -> Result<ActivationOutcome> {
        self.lifecycle.activate().await
    }

    /// Install and, when the outcome asks for it, activate right away.
    pub async fn install_and_activate(&self) -> Result<(InstallOutcome, Option<ActivationOutcome>)> {
        let installed = self.install().await?;
        let activated = if installed.activate_now { Some(self.activate().await?) } else { None };
        Ok((installed, activated))
    }

    /// Request early activation; activates immediately when installed.
    pub async fn skip_waiting(&self) -> Result<Option<ActivationOutcome>> {
        if self.lifecycle.skip_waiting() {
            return self.activate().await.map(Some);
        }
        debug!(state = %self.state(), "skip waiting recorded");
        Ok(None)
    }

    /// Stop serving because a newer generation took over.
    pub fn supersede(&self) {
        self.lifecycle.supersede();
    }

    /// Respond to an intercepted request.
    ///
    /// `None` means "not intercepted": the request is not a GET over http(s)
    /// or no generation is active yet. Otherwise a response is always
    /// produced; executor errors are answered from the cache or by the
    /// fallback resolver.
    pub async fn handle_fetch(&self, request: &Request) -> Option<Response> {
        if request.method() != Method::Get || !request.is_http() {
            return None;
        }
        let store = self.lifecycle.active_store()?;
        if !self.state().can_intercept_fetch() {
            return None;
        }

        let (strategy, job) = match self.route(request, store).await {
            Route::Forbidden(response) => return Some(response),
            Route::Run(strategy, job) => (strategy, job),
        };

        match self.executor.execute(strategy, &job).await {
            Ok(response) => Some(response),
            Err(err) => {
                warn!(url = %request.url(), strategy = %strategy, error = %err, "fetch failed, recovering");
                match self.executor.lookup(&job).await {
                    Some(cached) => Some(cached),
                    None => Some(self.executor.fallback(&job).await),
                }
            }
        }
    }

    /// Run the selected strategy and return its raw result.
    ///
    /// # Errors
    /// - `LanternError::InvalidInput` for requests that are not GET over
    ///   http(s).
    /// - `LanternError::NotFound` when no generation is active.
    /// - Whatever the strategy reports (`CacheMiss`, `Network`).
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        if request.method() != Method::Get || !request.is_http() {
            return Err(LanternError::InvalidInput(format!(
                "{} {} is not cacheable",
                request.method(),
                request.url()
            )));
        }
        let store = self
            .lifecycle
            .active_store()
            .ok_or_else(|| LanternError::NotFound("no active cache generation".to_string()))?;

        match self.route(request, store).await {
            Route::Forbidden(response) => Ok(response),
            Route::Run(strategy, job) => self.executor.execute(strategy, &job).await,
        }
    }

    /// Handle a control-channel message; the reply, if any, goes back over
    /// the message's reply port.
    pub async fn handle_message(&self, message: ControlMessage) -> Result<Option<ControlReply>> {
        debug!(message = ?message, "control message");
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting().await?;
                Ok(None)
            }
            ControlMessage::GetVersion => {
                Ok(Some(ControlReply::Version { version: self.version().to_string() }))
            }
            ControlMessage::GetStats => Ok(Some(ControlReply::Stats { stats: self.stats().await })),
            ControlMessage::ClearCache => {
                let cleared = self.clear_cache().await?;
                Ok(Some(ControlReply::Cleared { cleared }))
            }
        }
    }

    /// Drop every entry of the active generation.
    pub async fn clear_cache(&self) -> Result<usize> {
        let Some(store) = self.lifecycle.active_store() else {
            return Ok(0);
        };
        let cleared = store.clear().await?;
        info!(version = %self.version(), cleared, "cache cleared");
        Ok(cleared)
    }

    /// Counter snapshot, with the entry count of the active generation.
    pub async fn stats(&self) -> FetchStats {
        let entries = match self.lifecycle.active_store() {
            Some(store) => store.len().await.unwrap_or_default(),
            None => 0,
        };
        self.metrics.snapshot(entries)
    }

    /// Recent security denials, oldest first.
    pub fn security_events(&self) -> Vec<SecurityEvent> {
        self.security.event_log().events()
    }

    /// Wait for detached background work (revalidations, size sweeps).
    pub async fn settle(&self) {
        self.executor.settle().await;
    }

    async fn route(&self, request: &Request, store: Arc<dyn CacheStore>) -> Route {
        let class = self.selector.classify(request);
        let strategy = self.selector.strategy_for(class);

        let estimated_bytes = if class.is_size_guarded() {
            match self.janitor.estimate_size(store.as_ref()).await {
                Ok(estimate) => Some(estimate.bytes),
                Err(err) => {
                    warn!(error = %err, "cache size estimate failed");
                    None
                }
            }
        } else {
            None
        };

        let job = FetchJob::new(request.clone(), class, Arc::clone(&store));
        match self.security.evaluate(request, class, estimated_bytes) {
            SecurityVerdict::Allowed => Route::Run(strategy, job),
            SecurityVerdict::NoStore(_) => {
                self.executor.spawn_size_enforcement(store);
                Route::Run(strategy, job.with_policy(StorePolicy::Skip))
            }
            SecurityVerdict::Forbidden(_) => {
                self.metrics.record_forbidden();
                Route::Forbidden(Response::forbidden(FORBIDDEN_BODY))
            }
        }
    }
}
