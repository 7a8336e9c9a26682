//! Shared wiring for infra integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lantern_core::{CacheManager, Clients};
use lantern_domain::{Config, Result as DomainResult};
use lantern_infra::{HttpClient, HttpFetcher, MemoryCacheStorage};
use url::Url;

/// Counts claim calls.
#[derive(Default)]
pub struct CountingClients {
    claims: AtomicUsize,
}

impl CountingClients {
    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clients for CountingClients {
    async fn claim(&self) -> DomainResult<usize> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

/// Config whose application origin is `origin`, with a two-file precache.
pub fn config_for(origin: &str, version: &str) -> Config {
    let mut config = Config::default();
    config.cache.version = version.to_string();
    config.cache.app_origin = origin.to_string();
    config.precache.critical_files = vec!["/".into(), "/offline.html".into()];
    config.precache.static_files = vec!["/assets/images/logo.png".into()];
    config
}

pub struct Wired {
    pub manager: CacheManager,
    pub storage: Arc<MemoryCacheStorage>,
    pub clients: Arc<CountingClients>,
}

/// Manager over real adapters: memory storage and the reqwest fetcher.
pub fn wire(config: &Config, storage: Arc<MemoryCacheStorage>) -> Wired {
    let client = HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .base_backoff(Duration::from_millis(5))
        .max_attempts(config.network.max_attempts)
        .build()
        .expect("http client");
    let public = Url::parse(&config.cache.app_origin).expect("origin");
    let fetcher = HttpFetcher::new(client).with_upstream(&public, config.upstream().expect("upstream"));
    let clients = Arc::new(CountingClients::default());

    let manager = CacheManager::new(config, storage.clone(), Arc::new(fetcher), clients.clone())
        .expect("cache manager");
    Wired { manager, storage, clients }
}
