//! # Lantern Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - In-memory generational cache storage with byte accounting
//! - reqwest-backed network fetcher with retry and upstream rewriting
//! - Configuration loading from environment and files
//! - Conversions from third-party errors into `LanternError`
//!
//! ## Architecture
//! - Implements traits defined in `lantern-core`
//! - Depends on `lantern-domain` and `lantern-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpFetcher};
pub use storage::{MemoryCacheStorage, MemoryCacheStore};
