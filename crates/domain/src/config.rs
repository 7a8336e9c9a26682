//! Configuration structures
//!
//! Every section implements `Default` with the production defaults, and
//! `#[serde(default)]` lets config files override only what they need.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_ALLOWED_ORIGINS, DEFAULT_APP_ORIGIN, DEFAULT_BIND_ADDR, DEFAULT_BLOCKED_PATHS,
    DEFAULT_CACHE_VERSION, DEFAULT_CRITICAL_FILES, DEFAULT_MAX_CACHE_BYTES, DEFAULT_OFFLINE_URL,
    DEFAULT_PROXY_HEADERS, DEFAULT_SECURITY_LOG_CAPACITY, DEFAULT_SIZE_SAMPLE_LIMIT,
    DEFAULT_STATIC_FILES,
};
use crate::errors::{LanternError, Result};
use crate::types::StrategyTable;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub precache: PrecacheConfig,
    pub strategies: StrategyTable,
    pub security: SecurityConfig,
    pub network: NetworkConfig,
    pub server: ServerConfig,
}

/// Cache generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Identifier of the generation this build installs
    pub version: String,
    /// Origin of the application; relative precache paths resolve against it
    pub app_origin: String,
    /// Precached page served to documents when offline
    pub offline_url: String,
    /// Ceiling for the estimated total cache size
    pub max_cache_bytes: u64,
    /// Entries inspected when the size has to be estimated by sampling
    pub size_sample_limit: usize,
    /// Activate right after a successful install
    pub skip_waiting_on_install: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CACHE_VERSION.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            offline_url: DEFAULT_OFFLINE_URL.to_string(),
            max_cache_bytes: DEFAULT_MAX_CACHE_BYTES,
            size_sample_limit: DEFAULT_SIZE_SAMPLE_LIMIT,
            skip_waiting_on_install: true,
        }
    }
}

/// Files cached at install time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheConfig {
    /// Must all be cached for installation to succeed
    pub critical_files: Vec<String>,
    /// Cached on a best-effort basis
    pub static_files: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            critical_files: strings(DEFAULT_CRITICAL_FILES),
            static_files: strings(DEFAULT_STATIC_FILES),
        }
    }
}

/// Security filter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Cross-origin origins that may be served and cached
    pub allowed_origins: Vec<String>,
    /// Path prefixes never cached nor served offline
    pub blocked_paths: Vec<String>,
    /// Header names whose presence denies a request
    pub proxy_headers: Vec<String>,
    /// Number of security events kept in memory
    pub event_log_capacity: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: strings(DEFAULT_ALLOWED_ORIGINS),
            blocked_paths: strings(DEFAULT_BLOCKED_PATHS),
            proxy_headers: strings(DEFAULT_PROXY_HEADERS),
            event_log_capacity: DEFAULT_SECURITY_LOG_CAPACITY,
        }
    }
}

impl SecurityConfig {
    /// First blocked prefix `path` falls under.
    pub fn blocked_prefix(&self, path: &str) -> Option<&str> {
        self.blocked_paths
            .iter()
            .map(String::as_str)
            .find(|prefix| path.starts_with(prefix))
    }
}

/// Outgoing network settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_seconds: u64,
    /// Total attempts per fetch (initial try + retries)
    pub max_attempts: usize,
    pub backoff_millis: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30, max_attempts: 1, backoff_millis: 200 }
    }
}

/// Caching proxy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Upstream origin requests are forwarded to; the app origin when unset
    pub upstream: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: DEFAULT_BIND_ADDR.to_string(), upstream: None }
    }
}

impl Config {
    /// Parsed application origin.
    ///
    /// # Errors
    /// Returns `LanternError::Config` if `cache.app_origin` is not an absolute
    /// URL.
    pub fn app_origin(&self) -> Result<Url> {
        Url::parse(&self.cache.app_origin)
            .map_err(|e| LanternError::Config(format!("Invalid app origin: {e}")))
    }

    /// Parsed upstream origin, falling back to the application origin.
    pub fn upstream(&self) -> Result<Url> {
        match &self.server.upstream {
            Some(upstream) => Url::parse(upstream)
                .map_err(|e| LanternError::Config(format!("Invalid upstream: {e}"))),
            None => self.app_origin(),
        }
    }

    /// Check invariants the cache engine relies on.
    ///
    /// # Errors
    /// Returns `LanternError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.cache.version.trim().is_empty() {
            return Err(LanternError::Config("Cache version must not be empty".into()));
        }
        let origin = self.app_origin()?;
        self.upstream()?;
        for path in self.precache.critical_files.iter().chain(&self.precache.static_files) {
            let resolved = origin
                .join(path)
                .map_err(|e| LanternError::Config(format!("Invalid precache path '{path}': {e}")))?;
            if let Some(prefix) = self.security.blocked_prefix(resolved.path()) {
                return Err(LanternError::Config(format!(
                    "Precache path '{path}' is under blocked prefix '{prefix}'"
                )));
            }
        }
        if self.cache.size_sample_limit == 0 {
            return Err(LanternError::Config("Size sample limit must be at least 1".into()));
        }
        if self.network.max_attempts == 0 {
            return Err(LanternError::Config("Network attempts must be at least 1".into()));
        }
        if let Some(bad) = self.security.allowed_origins.iter().find(|o| Url::parse(o).is_err()) {
            return Err(LanternError::Config(format!("Invalid allowed origin: {bad}")));
        }
        Ok(())
    }
}
