//! Cache storage adapters

pub mod memory;

pub use memory::{MemoryCacheStorage, MemoryCacheStore};
