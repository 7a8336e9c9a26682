//! Error types used throughout the cache engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Lantern
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LanternError {
    /// The network could not produce a response (connection refused, DNS,
    /// timeout). HTTP error statuses are responses, not network errors.
    #[error("Network error: {0}")]
    Network(String),

    /// A cache-only lookup found nothing. Never converted into a fallback by
    /// the executor itself.
    #[error("Not available offline: {0}")]
    CacheMiss(String),

    #[error("Cache storage error: {0}")]
    Storage(String),

    /// A critical precache file could not be fetched or was not `ok`.
    #[error("Installation failed: {0}")]
    Install(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LanternError {
    /// Stable, lowercase label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::CacheMiss(_) => "cache_miss",
            Self::Storage(_) => "storage",
            Self::Install(_) => "install",
            Self::Security(_) => "security",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Lantern operations
pub type Result<T> = std::result::Result<T, LanternError>;
