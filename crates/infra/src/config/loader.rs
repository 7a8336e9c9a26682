//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `LANTERN_CACHE_VERSION`: Generation identifier (required)
//! - `LANTERN_ORIGIN`: Application origin (required)
//! - `LANTERN_MAX_CACHE_BYTES`: Cache size ceiling in bytes
//! - `LANTERN_CRITICAL_FILES`: Comma-separated critical precache paths
//! - `LANTERN_STATIC_FILES`: Comma-separated best-effort precache paths
//! - `LANTERN_ALLOWED_ORIGINS`: Comma-separated cross-origin allowlist
//! - `LANTERN_BLOCKED_PATHS`: Comma-separated blocked path prefixes
//! - `LANTERN_BIND_ADDR`: Proxy listen address
//! - `LANTERN_UPSTREAM`: Origin the proxy forwards to
//! - `LANTERN_SKIP_WAITING`: Activate right after install (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./lantern.json` or `./lantern.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names one and two directories up
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use lantern_domain::{Config, LanternError, Result};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: &[&str] = &["lantern.json", "lantern.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `LanternError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration does not validate
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `LANTERN_CACHE_VERSION` and `LANTERN_ORIGIN` must be present; every other
/// variable overrides the corresponding default when set.
///
/// # Errors
/// Returns `LanternError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.cache.version = env_var("LANTERN_CACHE_VERSION")?;
    config.cache.app_origin = env_var("LANTERN_ORIGIN")?;

    if let Some(raw) = env_opt("LANTERN_MAX_CACHE_BYTES") {
        config.cache.max_cache_bytes = raw
            .parse::<u64>()
            .map_err(|e| LanternError::Config(format!("Invalid max cache bytes: {}", e)))?;
    }
    if let Some(files) = env_list("LANTERN_CRITICAL_FILES") {
        config.precache.critical_files = files;
    }
    if let Some(files) = env_list("LANTERN_STATIC_FILES") {
        config.precache.static_files = files;
    }
    if let Some(origins) = env_list("LANTERN_ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins;
    }
    if let Some(paths) = env_list("LANTERN_BLOCKED_PATHS") {
        config.security.blocked_paths = paths;
    }
    if let Some(addr) = env_opt("LANTERN_BIND_ADDR") {
        config.server.bind_addr = addr;
    }
    config.server.upstream = env_opt("LANTERN_UPSTREAM");
    config.cache.skip_waiting_on_install =
        env_bool("LANTERN_SKIP_WAITING", config.cache.skip_waiting_on_install);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Fields missing from the file keep their defaults.
///
/// # Errors
/// Returns `LanternError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
///
/// I/O failures while reading an existing file are mapped by kind through
/// [`InfraError`].
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LanternError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LanternError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| LanternError::from(InfraError::from(e))),
        "json" => {
            serde_json::from_str(contents).map_err(|e| LanternError::from(InfraError::from(e)))
        }
        _ => Err(LanternError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| [root.clone(), root.join(".."), root.join("../..")])
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `LanternError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        LanternError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Comma-separated list, blank items dropped.
fn env_list(key: &str) -> Option<Vec<String>> {
    env_opt(key).map(|raw| {
        raw.split(',').map(str::trim).filter(|item| !item.is_empty()).map(String::from).collect()
    })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
