//! In-memory cache store mocks.
//!
//! Unlike the infra store these do not account for bytes, so the janitor has
//! to estimate sizes by sampling.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lantern_core::{CacheStorage, CacheStore};
use lantern_domain::{CacheKey, LanternError, Response, Result as DomainResult};
use tokio::sync::Notify;

/// Insertion-ordered store.
#[derive(Default)]
pub struct MockCacheStore {
    entries: Mutex<Vec<(CacheKey, Response)>>,
    undeletable: Mutex<HashSet<CacheKey>>,
    puts: AtomicUsize,
    keys_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every `keys()` call until [`release_keys`](Self::release_keys).
    pub fn stall_keys(&self) {
        *self.keys_gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_keys(&self) {
        if let Some(gate) = self.keys_gate.lock().unwrap().take() {
            gate.notify_waiters();
        }
    }

    /// Make deleting `key` fail.
    pub fn refuse_delete(&self, key: CacheKey) {
        self.undeletable.lock().unwrap().insert(key);
    }

    pub fn get(&self, url: &str) -> Option<Response> {
        let key = CacheKey::get(url).unwrap();
        self.entries.lock().unwrap().iter().find(|(k, _)| *k == key).map(|(_, r)| r.clone())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|(k, _)| k.url().to_string()).collect()
    }

    /// Seed an entry directly.
    pub fn insert(&self, url: &str, response: Response) {
        let key = CacheKey::get(url).unwrap();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|(k, _)| *k != key);
        entries.push((key, response));
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn match_key(&self, key: &CacheKey) -> DomainResult<Option<Response>> {
        Ok(self.entries.lock().unwrap().iter().find(|(k, _)| k == key).map(|(_, r)| r.clone()))
    }

    async fn put(&self, key: CacheKey, response: Response) -> DomainResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|(k, _)| *k != key);
        entries.push((key, response));
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> DomainResult<bool> {
        if self.undeletable.lock().unwrap().contains(key) {
            return Err(LanternError::Storage(format!("cannot delete {key}")));
        }
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> DomainResult<Vec<CacheKey>> {
        let gate = self.keys_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.entries.lock().unwrap().iter().map(|(k, _)| k.clone()).collect())
    }

    async fn len(&self) -> DomainResult<usize> {
        Ok(self.entries.lock().unwrap().len())
    }

    async fn clear(&self) -> DomainResult<usize> {
        let mut entries = self.entries.lock().unwrap();
        let cleared = entries.len();
        entries.clear();
        Ok(cleared)
    }
}

/// Named generations of [`MockCacheStore`].
#[derive(Default)]
pub struct MockCacheStorage {
    generations: Mutex<Vec<(String, Arc<MockCacheStore>)>>,
    fail_open: Mutex<bool>,
}

impl MockCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, name: &str) -> Option<Arc<MockCacheStore>> {
        self.generations
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| Arc::clone(s))
    }

    pub fn names(&self) -> Vec<String> {
        self.generations.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn fail_open(&self, fail: bool) {
        *self.fail_open.lock().unwrap() = fail;
    }
}

#[async_trait]
impl CacheStorage for MockCacheStorage {
    async fn open(&self, name: &str) -> DomainResult<Arc<dyn CacheStore>> {
        if *self.fail_open.lock().unwrap() {
            return Err(LanternError::Storage("storage unavailable".into()));
        }
        let mut generations = self.generations.lock().unwrap();
        if let Some((_, store)) = generations.iter().find(|(n, _)| n == name) {
            return Ok(store.clone());
        }
        let store = Arc::new(MockCacheStore::new());
        generations.push((name.to_string(), store.clone()));
        Ok(store)
    }

    async fn has(&self, name: &str) -> DomainResult<bool> {
        Ok(self.store(name).is_some())
    }

    async fn delete(&self, name: &str) -> DomainResult<bool> {
        let mut generations = self.generations.lock().unwrap();
        let Some(idx) = generations.iter().position(|(n, _)| n == name) else {
            return Ok(false);
        };
        let (_, store) = generations.remove(idx);
        store.entries.lock().unwrap().clear();
        Ok(true)
    }

    async fn keys(&self) -> DomainResult<Vec<String>> {
        Ok(self.names())
    }
}
