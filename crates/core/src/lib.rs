//! # Lantern Core
//!
//! The offline cache engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for cache storage, network access and clients
//! - Strategy selection and the five strategy executors
//! - Security filter, fallback resolver and cache janitor
//! - Generation lifecycle and the [`CacheManager`] context object
//!
//! ## Architecture Principles
//! - Only depends on `lantern-domain`
//! - No storage, HTTP or host-platform code
//! - All external dependencies via traits

pub mod fallback;
pub mod janitor;
pub mod lifecycle;
pub mod manager;
pub mod metrics;
pub mod ports;
pub mod security;
pub mod selector;
pub mod strategy;

pub use fallback::FallbackResolver;
pub use janitor::{CacheJanitor, EvictionReport, SizeEstimate};
pub use lifecycle::{ActivationOutcome, InstallOutcome, LifecycleManager};
pub use manager::CacheManager;
pub use metrics::FetchMetrics;
pub use ports::{CacheStorage, CacheStore, Clients, NetworkFetcher};
pub use security::{SecurityEventLog, SecurityFilter};
pub use selector::StrategySelector;
pub use strategy::{FetchJob, StorePolicy, StrategyExecutor};
