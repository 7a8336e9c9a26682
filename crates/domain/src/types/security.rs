//! Security verdicts and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the security filter refused a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    PathTraversal,
    ProxyHeader { header: String },
    BlockedPath { prefix: String },
    CrossOrigin { origin: String },
    CacheSizeExceeded { estimated_bytes: u64, limit_bytes: u64 },
}

impl DenialReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PathTraversal => "path_traversal",
            Self::ProxyHeader { .. } => "proxy_header",
            Self::BlockedPath { .. } => "blocked_path",
            Self::CrossOrigin { .. } => "cross_origin",
            Self::CacheSizeExceeded { .. } => "cache_size_exceeded",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::PathTraversal => "path contains a parent-directory segment".to_string(),
            Self::ProxyHeader { header } => format!("request carries '{header}' header"),
            Self::BlockedPath { prefix } => format!("path matches blocked prefix '{prefix}'"),
            Self::CrossOrigin { origin } => format!("origin '{origin}' is not allowlisted"),
            Self::CacheSizeExceeded { estimated_bytes, limit_bytes } => {
                format!("estimated cache size {estimated_bytes} exceeds {limit_bytes} bytes")
            }
        }
    }
}

/// Outcome of the security filter for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityVerdict {
    Allowed,
    /// Never served nor cached; the caller gets a forbidden response.
    Forbidden(DenialReason),
    /// Served from the network but the store step is skipped.
    NoStore(DenialReason),
}

impl SecurityVerdict {
    /// The boolean allow/deny contract: only an unconditional allow is `true`.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn may_serve(&self) -> bool {
        !matches!(self, Self::Forbidden(_))
    }

    pub fn may_store(&self) -> bool {
        self.is_allowed()
    }

    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            Self::Allowed => None,
            Self::Forbidden(reason) | Self::NoStore(reason) => Some(reason),
        }
    }
}

/// A logged security denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub kind: String,
    pub detail: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(reason: &DenialReason, url: impl Into<String>) -> Self {
        Self {
            kind: reason.kind().to_string(),
            detail: reason.detail(),
            url: url.into(),
            timestamp: Utc::now(),
        }
    }
}
