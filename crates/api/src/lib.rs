//! # Lantern App
//!
//! Host adapter layer - event surface, caching proxy and main entry point.
//!
//! This crate contains:
//! - The service-worker style event surface (install, activate, fetch,
//!   message, push, notification click, sync)
//! - The axum caching reverse proxy and its control endpoint
//! - Application context (dependency injection)
//! - Tracing setup and health reporting
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod host;
pub mod proxy;
pub mod utils;

// Re-export for convenience
pub use context::*;
pub use host::ServiceWorkerHost;
