//! Tracing setup and structured log helpers

use std::time::Duration;

use lantern_domain::ResponseSource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the output format (`json` or text).
pub const LOG_FORMAT_ENV: &str = "LANTERN_LOG_FORMAT";

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read [`LOG_FORMAT_ENV`]; anything but `json` means text.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` filters, `info` by default.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.is_ok()
}

/// Stable label for who produced a response.
#[inline]
pub fn source_label(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Network => "network",
        ResponseSource::Cache => "cache",
        ResponseSource::Fallback => "fallback",
        ResponseSource::Forbidden => "forbidden",
    }
}

/// Log the outcome of one proxied request.
///
/// `source` is `None` for requests the cache manager passed through.
#[inline]
pub fn log_request_outcome(
    method: &str,
    path: &str,
    status: u16,
    source: Option<ResponseSource>,
    elapsed: Duration,
) {
    let duration_ms = elapsed.as_millis() as u64;
    let source = source.map_or("passthrough", source_label);

    if status >= 500 {
        warn!(method, path, status, source, duration_ms, "request_failed");
    } else {
        info!(method, path, status, source, duration_ms, "request_served");
    }
}
