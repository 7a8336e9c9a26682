//! Application constants
//!
//! Centralized location for all domain-level defaults used by the cache
//! engine.

/// Default cache generation identifier.
pub const DEFAULT_CACHE_VERSION: &str = "lantern-cache-v2.0.0";

/// Path of the precached offline page served to documents when offline.
pub const DEFAULT_OFFLINE_URL: &str = "/offline.html";

/// Default origin of the application the cache sits in front of.
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:8000";

/// Estimated total cache size above which image/font caching is refused.
pub const DEFAULT_MAX_CACHE_BYTES: u64 = 50 * 1024 * 1024;

/// Number of entries the janitor inspects when it has to estimate sizes.
pub const DEFAULT_SIZE_SAMPLE_LIMIT: usize = 10;

/// Number of security events retained in memory.
pub const DEFAULT_SECURITY_LOG_CAPACITY: usize = 100;

/// Files that must be cached for installation to succeed.
pub const DEFAULT_CRITICAL_FILES: &[&str] = &[
    "/",
    "/index.html",
    "/assets/css/main.css",
    "/assets/js/main.js",
    "/assets/js/animations.js",
    "/manifest.json",
    "/offline.html",
];

/// Files cached on a best-effort basis at install time.
pub const DEFAULT_STATIC_FILES: &[&str] = &[
    "/assets/images/logo.png",
    "/assets/images/hero-bg.jpg",
    "/assets/fonts/nunito-v16-latin-regular.woff2",
    "/assets/fonts/nunito-v16-latin-700.woff2",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
];

/// Cross-origin hosts the cache may serve and store.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
    "https://cdnjs.cloudflare.com",
];

/// Path prefixes that are never cached nor served offline.
pub const DEFAULT_BLOCKED_PATHS: &[&str] = &["/admin", "/assets/js/admin", "/assets/css/admin"];

/// Headers that never appear on a same-origin browser request.
pub const DEFAULT_PROXY_HEADERS: &[&str] = &["x-forwarded-for", "x-real-ip", "via", "forwarded"];

/// Default address the caching proxy binds to.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Body of the generic "not available offline" response.
pub const UNAVAILABLE_OFFLINE_BODY: &str = "Resource not available offline";

/// Body of the forbidden response produced by the security filter.
pub const FORBIDDEN_BODY: &str = "Forbidden";
