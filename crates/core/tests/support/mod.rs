//! Shared test helpers for `lantern-core` integration tests.
//!
//! In-memory mocks of the cache, network and client ports so the tests can
//! focus on strategy and lifecycle behaviour.

#![allow(dead_code)]

pub mod clients;
pub mod network;
pub mod store;

use std::sync::Arc;

use lantern_core::CacheManager;
use lantern_domain::{Config, Response};

pub use clients::MockClients;
pub use network::ScriptedNetwork;
pub use store::{MockCacheStorage, MockCacheStore};

pub const ORIGIN: &str = "https://app.test";

/// Config rooted at [`ORIGIN`] with a small precache list.
pub fn test_config(version: &str) -> Config {
    let mut config = Config::default();
    config.cache.version = version.to_string();
    config.cache.app_origin = ORIGIN.to_string();
    config.precache.critical_files =
        vec!["/".into(), "/offline.html".into(), "/assets/js/main.js".into()];
    config.precache.static_files = vec!["/assets/images/logo.png".into()];
    config
}

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Network serving every precache file of [`test_config`].
pub fn precache_network() -> Arc<ScriptedNetwork> {
    let network = Arc::new(ScriptedNetwork::new());
    network.route(&url("/"), Response::html("<h1>home</h1>"));
    network.route(&url("/offline.html"), Response::html("<h1>cached offline</h1>"));
    network.route(&url("/assets/js/main.js"), Response::ok("console.log(1)"));
    network.route(&url("/assets/images/logo.png"), Response::ok(vec![0u8; 16]));
    network
}

pub struct Harness {
    pub manager: CacheManager,
    pub storage: Arc<MockCacheStorage>,
    pub network: Arc<ScriptedNetwork>,
    pub clients: Arc<MockClients>,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            config,
            Arc::new(MockCacheStorage::new()),
            precache_network(),
            Arc::new(MockClients::new(2)),
        )
    }

    pub fn with_parts(
        config: Config,
        storage: Arc<MockCacheStorage>,
        network: Arc<ScriptedNetwork>,
        clients: Arc<MockClients>,
    ) -> Self {
        let manager = CacheManager::new(
            &config,
            storage.clone(),
            network.clone(),
            clients.clone(),
        )
        .unwrap();
        Self { manager, storage, network, clients }
    }

    /// Harness whose generation is installed and active.
    pub async fn active(config: Config) -> Self {
        let harness = Self::new(config);
        harness.manager.install().await.unwrap();
        harness.manager.activate().await.unwrap();
        harness
    }

    pub fn store(&self) -> Arc<MockCacheStore> {
        self.storage.store(self.manager.version()).unwrap()
    }
}
