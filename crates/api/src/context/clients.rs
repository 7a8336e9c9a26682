//! In-process client registry

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lantern_core::Clients;
use lantern_domain::Result;
use parking_lot::RwLock;

/// A page the host process knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: u64,
    pub url: String,
    /// Whether the active generation serves this client.
    pub controlled: bool,
}

/// Tracks open clients and implements the claim port over them.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    clients: RwLock<Vec<ClientInfo>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an uncontrolled client showing `url`; returns its id.
    pub fn register(&self, url: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.clients.write().push(ClientInfo { id, url: url.into(), controlled: false });
        id
    }

    /// Returns `false` if the id was unknown.
    pub fn unregister(&self, id: u64) -> bool {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|client| client.id != id);
        clients.len() != before
    }

    /// First client showing exactly `url`.
    pub fn find_by_url(&self, url: &str) -> Option<ClientInfo> {
        self.clients.read().iter().find(|client| client.url == url).cloned()
    }

    pub fn controlled(&self) -> usize {
        self.clients.read().iter().filter(|client| client.controlled).count()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn claim(&self) -> Result<usize> {
        let mut clients = self.clients.write();
        for client in clients.iter_mut() {
            client.controlled = true;
        }
        Ok(clients.len())
    }
}
