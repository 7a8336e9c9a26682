//! # Lantern Domain
//!
//! Domain types and models for the Lantern offline cache manager.
//!
//! This crate contains:
//! - The HTTP request/response model the cache engine works on
//! - Resource classes, caching strategies and cache keys
//! - Security verdicts and events, lifecycle states, control messages
//! - Configuration structures, constants and the domain error type
//!
//! ## Architecture
//! - No dependencies on other Lantern crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
