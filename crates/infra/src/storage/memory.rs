//! In-memory generational cache storage.
//!
//! Each generation is a [`MemoryCacheStore`] guarded by a
//! `tokio::sync::RwLock`: concurrent readers, one writer at a time, so
//! writes to the same key are serialised and the last completed `put` wins.
//! Stores keep an insertion counter for eviction order and an exact running
//! total of body bytes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lantern_core::{CacheStorage, CacheStore};
use lantern_domain::{CacheKey, Response, Result};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredEntry {
    response: Response,
    insertion_order: u64,
}

#[derive(Debug, Default)]
struct Entries {
    data: HashMap<CacheKey, StoredEntry>,
    insertion_counter: u64,
    bytes: u64,
}

/// One cache generation held in memory.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<Entries>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn match_key(&self, key: &CacheKey) -> Result<Option<Response>> {
        let entries = self.entries.read().await;
        Ok(entries.data.get(key).map(|entry| entry.response.clone()))
    }

    async fn put(&self, key: CacheKey, response: Response) -> Result<()> {
        let mut entries = self.entries.write().await;
        let added = response.body_len();
        let entry = StoredEntry { response, insertion_order: entries.insertion_counter };
        entries.insertion_counter += 1;
        if let Some(previous) = entries.data.insert(key, entry) {
            entries.bytes = entries.bytes.saturating_sub(previous.response.body_len());
        }
        entries.bytes += added;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.data.remove(key) {
            Some(removed) => {
                entries.bytes = entries.bytes.saturating_sub(removed.response.body_len());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn keys(&self) -> Result<Vec<CacheKey>> {
        let entries = self.entries.read().await;
        let mut ordered: Vec<_> = entries.data.iter().collect();
        ordered.sort_by_key(|(_, entry)| entry.insertion_order);
        Ok(ordered.into_iter().map(|(key, _)| key.clone()).collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.data.len())
    }

    async fn byte_size(&self) -> Result<Option<u64>> {
        Ok(Some(self.entries.read().await.bytes))
    }

    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let cleared = entries.data.len();
        entries.data.clear();
        entries.bytes = 0;
        Ok(cleared)
    }
}

#[derive(Debug, Default)]
struct Generations {
    stores: HashMap<String, (u64, Arc<MemoryCacheStore>)>,
    counter: u64,
}

/// Registry of named in-memory generations.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    generations: RwLock<Generations>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        let mut generations = self.generations.write().await;
        if let Some((_, store)) = generations.stores.get(name) {
            return Ok(Arc::clone(store) as Arc<dyn CacheStore>);
        }
        let order = generations.counter;
        generations.counter += 1;
        let store = Arc::new(MemoryCacheStore::new());
        generations.stores.insert(name.to_string(), (order, Arc::clone(&store)));
        debug!(generation = %name, "created cache generation");
        Ok(store)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.generations.read().await.stores.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.generations.write().await.stores.remove(name);
        match removed {
            Some((_, store)) => {
                // Handles still held elsewhere must not keep serving entries.
                store.clear().await?;
                debug!(generation = %name, "deleted cache generation");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let generations = self.generations.read().await;
        let mut ordered: Vec<_> = generations.stores.iter().collect();
        ordered.sort_by_key(|(_, (order, _))| *order);
        Ok(ordered.into_iter().map(|(name, _)| name.clone()).collect())
    }
}
