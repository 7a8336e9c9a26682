#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lantern_core::NetworkFetcher;
use lantern_domain::{Config, LanternError, Request, Response, Result};
use lantern_infra::MemoryCacheStorage;
use lantern_lib::{AppContext, ClientRegistry};
use parking_lot::Mutex;

pub const ORIGIN: &str = "https://app.test";

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Network that answers from a fixed table and records what it was asked.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    requests: Mutex<Vec<Request>>,
}

impl StubNetwork {
    pub fn route(&self, path: &str, response: Response) {
        self.routes.lock().insert(url(path), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn calls_for(&self, path: &str) -> usize {
        let target = url(path);
        self.requests.lock().iter().filter(|r| r.url().as_str() == target).count()
    }
}

#[async_trait]
impl NetworkFetcher for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.requests.lock().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(LanternError::Network("offline".into()));
        }
        Ok(self
            .routes
            .lock()
            .get(request.url().as_str())
            .cloned()
            .unwrap_or_else(|| Response::not_found("no route")))
    }
}

pub fn test_config(version: &str) -> Config {
    let mut config = Config::default();
    config.cache.version = version.to_string();
    config.cache.app_origin = ORIGIN.to_string();
    config.precache.critical_files = vec!["/".into(), "/offline.html".into()];
    config.precache.static_files = vec!["/assets/images/logo.png".into()];
    config
}

/// Network serving the precache set of [`test_config`].
pub fn site_network() -> Arc<StubNetwork> {
    let network = Arc::new(StubNetwork::default());
    network.route("/", Response::html("<h1>home</h1>"));
    network.route("/offline.html", Response::html("<h1>offline</h1>"));
    network.route(
        "/assets/images/logo.png",
        Response::ok(vec![0x89, b'P', b'N', b'G']).with_header("content-type", "image/png"),
    );
    network
}

pub struct TestApp {
    pub context: AppContext,
    pub network: Arc<StubNetwork>,
    pub clients: Arc<ClientRegistry>,
}

pub fn test_app(config: Config, network: Arc<StubNetwork>) -> TestApp {
    let clients = Arc::new(ClientRegistry::new());
    let context = AppContext::with_ports(
        config,
        Arc::new(MemoryCacheStorage::new()),
        network.clone(),
        clients.clone(),
    )
    .expect("app context");
    TestApp { context, network, clients }
}

/// App whose generation is installed and active.
pub async fn started_app() -> TestApp {
    let app = test_app(test_config("v1"), site_network());
    app.context.host.start().await.expect("start");
    app
}
