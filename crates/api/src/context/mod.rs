//! Application context - dependency injection container

mod clients;

use std::sync::Arc;

use lantern_core::{CacheManager, CacheStorage, NetworkFetcher};
use lantern_domain::{Config, Result};
use lantern_infra::{HttpClient, HttpFetcher, MemoryCacheStorage};
use tracing::info;

pub use clients::{ClientInfo, ClientRegistry};

use crate::host::ServiceWorkerHost;
use crate::utils::health::{self, HealthStatus};

/// Type alias for cache storage port trait object
type DynCacheStoragePort = dyn CacheStorage + Send + Sync + 'static;

/// Type alias for network fetcher port trait object
type DynNetworkFetcherPort = dyn NetworkFetcher + Send + Sync + 'static;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<DynCacheStoragePort>,
    pub network: Arc<DynNetworkFetcherPort>,
    pub clients: Arc<ClientRegistry>,
    pub manager: Arc<CacheManager>,
    pub host: Arc<ServiceWorkerHost>,
}

impl AppContext {
    /// Load configuration and wire the production adapters.
    ///
    /// # Errors
    /// Returns `LanternError::Config` if no valid configuration is found.
    pub fn new() -> Result<Self> {
        let config = lantern_infra::config::load()?;
        Self::new_with_config(config)
    }

    /// Wire in-memory storage and the reqwest fetcher for `config`.
    ///
    /// Requests for the application origin go out to `server.upstream`
    /// when it is set.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let client = HttpClient::from_config(&config.network)?;
        let fetcher = HttpFetcher::new(client).with_upstream(&config.app_origin()?, config.upstream()?);
        Self::with_ports(
            config,
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(fetcher),
            Arc::new(ClientRegistry::new()),
        )
    }

    /// Wire explicit adapters; used by tests and embedders.
    pub fn with_ports(
        config: Config,
        storage: Arc<DynCacheStoragePort>,
        network: Arc<DynNetworkFetcherPort>,
        clients: Arc<ClientRegistry>,
    ) -> Result<Self> {
        let manager = Arc::new(CacheManager::new(
            &config,
            Arc::clone(&storage) as Arc<dyn CacheStorage>,
            Arc::clone(&network) as Arc<dyn NetworkFetcher>,
            clients.clone(),
        )?);
        let host = Arc::new(ServiceWorkerHost::new(Arc::clone(&manager), Arc::clone(&clients)));

        info!(
            version = %manager.version(),
            origin = %config.cache.app_origin,
            upstream = ?config.server.upstream,
            "application context ready"
        );

        Ok(Self { config, storage, network, clients, manager, host })
    }

    /// Component health of the cache manager.
    pub async fn health_check(&self) -> HealthStatus {
        health::check(&self.manager).await
    }

    /// Wait for background cache work to finish.
    pub async fn shutdown(&self) {
        self.manager.settle().await;
        info!(version = %self.manager.version(), "application context shut down");
    }
}
