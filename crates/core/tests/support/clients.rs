//! Client registry mock.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lantern_core::Clients;
use lantern_domain::Result as DomainResult;

/// Reports a fixed number of open clients and counts claims.
pub struct MockClients {
    open: usize,
    claims: AtomicUsize,
}

impl MockClients {
    pub fn new(open: usize) -> Self {
        Self { open, claims: AtomicUsize::new(0) }
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clients for MockClients {
    async fn claim(&self) -> DomainResult<usize> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(self.open)
    }
}
