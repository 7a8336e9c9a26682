//! Generation lifecycle
//!
//! Install populates a new generation from the precache lists, activate
//! retires every other generation and takes over the clients.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Active -> Superseded
//!               |
//!               +-> Redundant (critical precache failed)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use lantern_domain::{CacheKey, Config, LanternError, LifecycleState, Request, Response, Result};
use parking_lot::RwLock;
use tracing::{error, info, warn};
use url::Url;

use crate::ports::{CacheStorage, CacheStore, Clients, NetworkFetcher};

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: String,
    pub critical_cached: usize,
    pub static_cached: usize,
    pub static_failed: usize,
    /// Activation should follow right away instead of waiting.
    pub activate_now: bool,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    pub version: String,
    /// Generations deleted during activation.
    pub superseded: Vec<String>,
    pub clients_claimed: usize,
}

/// Owns the install/activate state machine of one generation.
pub struct LifecycleManager {
    version: String,
    app_origin: Url,
    critical_files: Vec<String>,
    static_files: Vec<String>,
    skip_waiting_on_install: bool,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn NetworkFetcher>,
    clients: Arc<dyn Clients>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    active: RwLock<Option<Arc<dyn CacheStore>>>,
}

impl LifecycleManager {
    /// # Errors
    /// Returns `LanternError::Config` when the application origin is invalid.
    pub fn new(
        config: &Config,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn NetworkFetcher>,
        clients: Arc<dyn Clients>,
    ) -> Result<Self> {
        Ok(Self {
            version: config.cache.version.clone(),
            app_origin: config.app_origin()?,
            critical_files: config.precache.critical_files.clone(),
            static_files: config.precache.static_files.clone(),
            skip_waiting_on_install: config.cache.skip_waiting_on_install,
            storage,
            network,
            clients,
            state: RwLock::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            active: RwLock::new(None),
        })
    }

    /// Version string naming this generation.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Store of the active generation, `None` until activation.
    pub fn active_store(&self) -> Option<Arc<dyn CacheStore>> {
        self.active.read().clone()
    }

    /// Request early activation. Returns whether the generation is installed
    /// and can therefore activate now.
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.store(true, Ordering::Release);
        self.state() == LifecycleState::Installed
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Create and populate the generation for the current version.
    ///
    /// Every critical file is fetched (concurrently) and checked before any
    /// of them is stored; a single failure deletes the generation and leaves the state
    /// `Redundant`. Static files are cached one by one, failures are logged.
    ///
    /// # Errors
    /// `LanternError::Install` when the state does not allow installing or
    /// when critical precaching fails.
    pub async fn install(&self) -> Result<InstallOutcome> {
        self.transition(LifecycleState::can_install, LifecycleState::Installing)?;
        info!(version = %self.version, "installing cache generation");

        let store = match self.storage.open(&self.version).await {
            Ok(store) => store,
            Err(err) => return Err(self.abort_install(err).await),
        };

        let critical = match self.fetch_critical().await {
            Ok(critical) => critical,
            Err(err) => return Err(self.abort_install(err).await),
        };
        let critical_cached = critical.len();
        for (key, response) in critical {
            if let Err(err) = store.put(key, response).await {
                return Err(self.abort_install(err).await);
            }
        }
        info!(version = %self.version, files = critical_cached, "critical files cached");

        let (static_cached, static_failed) = self.cache_static(store.as_ref()).await;

        self.set_state(LifecycleState::Installed);
        let activate_now = self.skip_waiting_on_install
            || self.skip_waiting_requested()
            || !self.has_other_generation().await;
        info!(
            version = %self.version,
            static_cached,
            static_failed,
            activate_now,
            "cache generation installed"
        );

        Ok(InstallOutcome {
            version: self.version.clone(),
            critical_cached,
            static_cached,
            static_failed,
            activate_now,
        })
    }

    /// Make the installed generation the only one.
    ///
    /// Deletion failures for old generations and a failing client claim are
    /// logged, they do not fail activation.
    ///
    /// # Errors
    /// `LanternError::Install` when the generation is not installed, or a
    /// storage error opening the generation.
    pub async fn activate(&self) -> Result<ActivationOutcome> {
        self.transition(LifecycleState::can_activate, LifecycleState::Activating)?;
        info!(version = %self.version, "activating cache generation");

        let mut superseded = Vec::new();
        match self.storage.keys().await {
            Ok(names) => {
                for name in names.into_iter().filter(|name| *name != self.version) {
                    match self.storage.delete(&name).await {
                        Ok(_) => {
                            info!(generation = %name, "deleted superseded generation");
                            superseded.push(name);
                        }
                        Err(err) => warn!(generation = %name, error = %err, "failed to delete generation"),
                    }
                }
            }
            Err(err) => warn!(error = %err, "failed to list cache generations"),
        }

        let store = match self.storage.open(&self.version).await {
            Ok(store) => store,
            Err(err) => {
                self.set_state(LifecycleState::Installed);
                return Err(err);
            }
        };
        *self.active.write() = Some(store);
        self.set_state(LifecycleState::Active);

        let clients_claimed = match self.clients.claim().await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "failed to claim clients");
                0
            }
        };
        info!(version = %self.version, superseded = superseded.len(), clients_claimed, "cache generation active");

        Ok(ActivationOutcome { version: self.version.clone(), superseded, clients_claimed })
    }

    /// Mark this generation as replaced by a newer one and stop serving.
    pub fn supersede(&self) {
        *self.active.write() = None;
        self.set_state(LifecycleState::Superseded);
    }

    async fn has_other_generation(&self) -> bool {
        match self.storage.keys().await {
            Ok(names) => names.iter().any(|name| *name != self.version),
            Err(_) => false,
        }
    }

    async fn fetch_critical(&self) -> Result<Vec<(CacheKey, Response)>> {
        try_join_all(self.critical_files.iter().map(|path| self.fetch_critical_one(path))).await
    }

    async fn fetch_critical_one(&self, path: &str) -> Result<(CacheKey, Response)> {
        let request = Request::get_relative(&self.app_origin, path)?;
        let response = self.network.fetch(&request).await.map_err(|err| {
            LanternError::Install(format!("critical file '{path}' unreachable: {err}"))
        })?;
        if !response.is_ok() {
            return Err(LanternError::Install(format!(
                "critical file '{path}' returned status {}",
                response.status
            )));
        }
        Ok((CacheKey::get(request.url().as_str())?, response))
    }

    async fn cache_static(&self, store: &dyn CacheStore) -> (usize, usize) {
        let results = join_all(self.static_files.iter().map(|path| async move {
            (path, self.cache_one(store, path).await)
        }))
        .await;

        let mut cached = 0;
        let mut failed = 0;
        for (path, result) in results {
            match result {
                Ok(()) => cached += 1,
                Err(err) => {
                    failed += 1;
                    warn!(path = %path, error = %err, "static file not cached");
                }
            }
        }
        (cached, failed)
    }

    async fn cache_one(&self, store: &dyn CacheStore, path: &str) -> Result<()> {
        let request = Request::get_relative(&self.app_origin, path)?;
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(LanternError::Network(format!("status {}", response.status)));
        }
        store.put(CacheKey::get(request.url().as_str())?, response).await
    }

    async fn abort_install(&self, cause: LanternError) -> LanternError {
        error!(version = %self.version, error = %cause, "installation failed");
        if let Err(err) = self.storage.delete(&self.version).await {
            warn!(version = %self.version, error = %err, "failed to discard partial generation");
        }
        self.set_state(LifecycleState::Redundant);
        match cause {
            LanternError::Install(_) => cause,
            other => LanternError::Install(other.to_string()),
        }
    }

    fn transition(
        &self,
        allowed: fn(&LifecycleState) -> bool,
        next: LifecycleState,
    ) -> Result<()> {
        let mut state = self.state.write();
        if !allowed(&*state) {
            return Err(LanternError::Install(format!(
                "cannot move from {} to {}",
                state.as_str(),
                next.as_str()
            )));
        }
        *state = next;
        Ok(())
    }

    fn set_state(&self, next: LifecycleState) {
        *self.state.write() = next;
    }
}
