//! Scripted network mock.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lantern_core::NetworkFetcher;
use lantern_domain::{LanternError, Request, Response, Result as DomainResult};
use tokio::sync::Notify;

/// Serves canned responses per URL.
///
/// Unknown URLs get a 404. While offline, or for URLs marked as failing,
/// fetches return `LanternError::Network`. A gate, once installed, holds
/// every fetch until [`release`](Self::release) is called.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    offline: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Hold fetches until [`release`](Self::release).
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_waiters();
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl NetworkFetcher for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> DomainResult<Response> {
        let url = request.url().to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(LanternError::Network(format!("unreachable: {url}")));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes.get(&url).cloned().unwrap_or_else(|| Response::not_found("missing")))
    }
}
