//! Port interfaces for the offline cache manager
//!
//! These traits define the boundaries between the cache engine and the
//! storage, network and client-registry implementations it runs on.

use std::sync::Arc;

use async_trait::async_trait;
use lantern_domain::{CacheKey, Request, Response, Result};

/// One cache generation: a key → response map that remembers insertion
/// order.
///
/// Implementations must tolerate concurrent readers and independent writers
/// to different keys; for the same key the last completed `put` wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stored response for `key`, if any.
    async fn match_key(&self, key: &CacheKey) -> Result<Option<Response>>;

    /// Store `response` under `key`, replacing any previous value. A replaced
    /// entry counts as newly inserted.
    async fn put(&self, key: CacheKey, response: Response) -> Result<()>;

    /// Remove `key`; returns whether an entry existed.
    async fn delete(&self, key: &CacheKey) -> Result<bool>;

    /// All keys, oldest insertion first.
    async fn keys(&self) -> Result<Vec<CacheKey>>;

    /// Number of entries.
    async fn len(&self) -> Result<usize>;

    /// Whether the store holds no entries.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Exact total of stored body bytes, when the store accounts for them.
    ///
    /// Stores returning `None` get their size estimated by sampling.
    async fn byte_size(&self) -> Result<Option<u64>> {
        Ok(None)
    }

    /// Remove every entry; returns how many were removed.
    async fn clear(&self) -> Result<usize>;
}

/// Registry of named cache generations.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the generation called `name`, creating it when missing.
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>>;

    async fn has(&self, name: &str) -> Result<bool>;

    /// Drop the generation and all its entries; returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all existing generations, oldest first.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Outgoing network access.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    /// Perform `request`.
    ///
    /// HTTP error statuses are returned as responses; `Err` means no
    /// response was obtained at all (`LanternError::Network`).
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// The clients (pages, tabs, connections) a generation may control.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Make the active generation control every open client immediately.
    /// Returns the number of clients claimed.
    async fn claim(&self) -> Result<usize>;
}
