//! Request security filter
//!
//! Checks run in a fixed order and short-circuit on the first denial:
//! path traversal, proxy headers, blocked paths, cross-origin allowlist and
//! finally the cache-size guard for images and fonts. Denials are recorded
//! in a bounded [`SecurityEventLog`].

use std::collections::VecDeque;
use std::sync::Arc;

use lantern_domain::{
    Config, DenialReason, Request, ResourceClass, SecurityEvent, SecurityVerdict,
};
use parking_lot::Mutex;
use tracing::warn;

const TRAVERSAL_PATTERNS: &[&str] = &["..", "%2e%2e", "%2e.", ".%2e"];

/// Bounded, most-recent-last log of security denials.
#[derive(Debug)]
pub struct SecurityEventLog {
    capacity: usize,
    events: Mutex<VecDeque<SecurityEvent>>,
}

impl SecurityEventLog {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), events: Mutex::new(VecDeque::new()) }
    }

    /// Record a denial, dropping the oldest event once full.
    pub fn record(&self, reason: &DenialReason, url: &str) -> SecurityEvent {
        let event = SecurityEvent::new(reason, url);
        warn!(kind = %event.kind, detail = %event.detail, url = %event.url, "security event");

        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
        event
    }

    /// Snapshot, oldest first.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

/// Gate deciding whether a request may be served and stored.
#[derive(Debug, Clone)]
pub struct SecurityFilter {
    app_origin: String,
    allowed_origins: Vec<String>,
    blocked_paths: Vec<String>,
    proxy_headers: Vec<String>,
    max_cache_bytes: u64,
    log: Arc<SecurityEventLog>,
}

impl SecurityFilter {
    /// Build the filter from configuration.
    ///
    /// An unparseable application origin leaves every origin foreign, so
    /// only allowlisted origins pass.
    pub fn new(config: &Config, log: Arc<SecurityEventLog>) -> Self {
        let app_origin = config
            .app_origin()
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default();

        Self {
            app_origin,
            allowed_origins: config
                .security
                .allowed_origins
                .iter()
                .map(|origin| origin.trim_end_matches('/').to_string())
                .collect(),
            blocked_paths: config.security.blocked_paths.clone(),
            proxy_headers: config.security.proxy_headers.clone(),
            max_cache_bytes: config.cache.max_cache_bytes,
            log,
        }
    }

    pub fn event_log(&self) -> &Arc<SecurityEventLog> {
        &self.log
    }

    /// Verdict for `request` without recording anything.
    ///
    /// `estimated_bytes` is the current cache size estimate; the size guard
    /// only applies to image and font requests when it is known.
    pub fn check(
        &self,
        request: &Request,
        class: ResourceClass,
        estimated_bytes: Option<u64>,
    ) -> SecurityVerdict {
        if has_traversal(request.raw_path()) {
            return SecurityVerdict::Forbidden(DenialReason::PathTraversal);
        }

        if let Some(header) =
            self.proxy_headers.iter().find(|header| request.headers().contains(header))
        {
            return SecurityVerdict::Forbidden(DenialReason::ProxyHeader {
                header: header.clone(),
            });
        }

        let path = request.path();
        if let Some(prefix) =
            self.blocked_paths.iter().find(|prefix| path.starts_with(prefix.as_str()))
        {
            return SecurityVerdict::Forbidden(DenialReason::BlockedPath {
                prefix: prefix.clone(),
            });
        }

        let origin = request.origin();
        if origin != self.app_origin && !self.allowed_origins.iter().any(|allowed| *allowed == origin)
        {
            return SecurityVerdict::Forbidden(DenialReason::CrossOrigin { origin });
        }

        if class.is_size_guarded() {
            if let Some(estimated_bytes) = estimated_bytes {
                if estimated_bytes > self.max_cache_bytes {
                    return SecurityVerdict::NoStore(DenialReason::CacheSizeExceeded {
                        estimated_bytes,
                        limit_bytes: self.max_cache_bytes,
                    });
                }
            }
        }

        SecurityVerdict::Allowed
    }

    /// [`check`](Self::check), recording any denial in the event log.
    pub fn evaluate(
        &self,
        request: &Request,
        class: ResourceClass,
        estimated_bytes: Option<u64>,
    ) -> SecurityVerdict {
        let verdict = self.check(request, class, estimated_bytes);
        if let Some(reason) = verdict.reason() {
            self.log.record(reason, request.raw_url());
        }
        verdict
    }

    /// Boolean form of the first four checks. The size guard needs a cache
    /// estimate and is not part of it.
    pub fn is_allowed(&self, request: &Request) -> bool {
        self.check(request, ResourceClass::Other, None).is_allowed()
    }
}

fn has_traversal(raw_path: &str) -> bool {
    let lowered = raw_path.to_ascii_lowercase();
    if TRAVERSAL_PATTERNS.iter().any(|pattern| lowered.contains(pattern)) {
        return true;
    }
    let decoded = urlencoding::decode_binary(lowered.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded).to_ascii_lowercase();
    TRAVERSAL_PATTERNS.iter().any(|pattern| decoded.contains(pattern))
}
