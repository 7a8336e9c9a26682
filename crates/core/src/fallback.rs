//! Fallback responses
//!
//! Produces a substitute response when neither the network nor the cache can
//! satisfy a request. Resolution never fails.

use lantern_domain::constants::UNAVAILABLE_OFFLINE_BODY;
use lantern_domain::{CacheKey, Request, ResourceClass, Response, ResponseSource};
use tracing::{debug, warn};

use crate::ports::CacheStore;

const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Offline</title>
  <style>
    body {
      font-family: -apple-system, BlinkMacSystemFont, sans-serif;
      margin: 0;
      display: flex;
      align-items: center;
      justify-content: center;
      min-height: 100vh;
      background: linear-gradient(135deg, #4ecdc4, #ff6b6b);
      color: white;
      text-align: center;
    }
    .offline-container { max-width: 500px; padding: 2rem; }
    h1 { font-size: 2rem; margin-bottom: 1rem; }
    p { font-size: 1.1rem; line-height: 1.6; opacity: 0.9; }
    .retry-btn {
      background: rgba(255, 255, 255, 0.2);
      border: 2px solid white;
      color: white;
      padding: 0.75rem 1.5rem;
      border-radius: 0.5rem;
      font-size: 1rem;
      cursor: pointer;
    }
  </style>
</head>
<body>
  <div class="offline-container">
    <h1>You are offline</h1>
    <p>No network connection is available. Pages you already visited remain reachable.</p>
    <button class="retry-btn" onclick="window.location.reload()">Retry</button>
  </div>
</body>
</html>
"#;

const PLACEHOLDER_SVG: &str = r##"<svg width="400" height="300" xmlns="http://www.w3.org/2000/svg">
  <rect width="400" height="300" fill="#f8fafc"/>
  <circle cx="200" cy="120" r="40" fill="#4ecdc4" opacity="0.3"/>
  <rect x="160" y="180" width="80" height="8" fill="#4ecdc4" opacity="0.3" rx="4"/>
  <rect x="140" y="200" width="120" height="6" fill="#4ecdc4" opacity="0.2" rx="3"/>
  <text x="200" y="250" font-family="Arial" font-size="14" fill="#718096" text-anchor="middle">Image unavailable</text>
</svg>
"##;

/// Builds substitute responses for unsatisfiable requests.
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    offline_key: Option<CacheKey>,
}

impl FallbackResolver {
    /// `offline_key` is the cache identity of the precached offline page.
    pub fn new(offline_key: Option<CacheKey>) -> Self {
        Self { offline_key }
    }

    /// Substitute response for `request`.
    ///
    /// Documents (or requests accepting HTML) get the cached offline page,
    /// or an inline one; images get an SVG placeholder; everything else gets
    /// a 404.
    pub async fn resolve(
        &self,
        request: &Request,
        class: ResourceClass,
        store: &dyn CacheStore,
    ) -> Response {
        let response = if class == ResourceClass::Document || request.accepts_html() {
            match self.cached_offline_page(store).await {
                Some(page) => page,
                None => Response::html(OFFLINE_HTML),
            }
        } else if class == ResourceClass::Image {
            Response::svg(PLACEHOLDER_SVG)
        } else {
            Response::not_found(UNAVAILABLE_OFFLINE_BODY)
        };

        debug!(url = %request.url(), class = %class, status = response.status, "serving fallback");
        response.with_source(ResponseSource::Fallback)
    }

    async fn cached_offline_page(&self, store: &dyn CacheStore) -> Option<Response> {
        let key = self.offline_key.as_ref()?;
        match store.match_key(key).await {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, key = %key, "offline page lookup failed");
                None
            }
        }
    }
}

/// The inline offline page.
pub fn offline_html() -> &'static str {
    OFFLINE_HTML
}

/// The inline image placeholder.
pub fn placeholder_svg() -> &'static str {
    PLACEHOLDER_SVG
}
