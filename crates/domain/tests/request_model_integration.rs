//! Integration tests for the request/response model
//!
//! Scenarios follow what the cache engine does with a request: classify it,
//! derive its cache key and decide what the security verdict allows.

use lantern_domain::{
    CacheKey, Config, DenialReason, Method, Request, ResourceClass, Response, ResponseSource,
    SecurityVerdict, Strategy, StrategyTable,
};

// ============================================================================
// Request identity
// ============================================================================

/// Fragments never split cache entries; queries do.
#[test]
fn test_cache_key_ignores_fragment_but_not_query() {
    let plain = Request::get("https://app.test/events.html").unwrap();
    let anchored = Request::get("https://app.test/events.html#today").unwrap();
    let queried = Request::get("https://app.test/events.html?page=2").unwrap();

    assert_eq!(CacheKey::for_request(&plain), CacheKey::for_request(&anchored));
    assert_ne!(CacheKey::for_request(&plain), CacheKey::for_request(&queried));
}

#[test]
fn test_only_get_requests_have_cache_keys() {
    for method in [Method::Post, Method::Put, Method::Delete, Method::Head] {
        let request = Request::new(method, "https://app.test/api/events").unwrap();
        assert!(CacheKey::for_request(&request).is_none(), "{method} must not be cacheable");
    }
}

/// URL parsing removes dot segments; the raw text keeps them for the
/// traversal check.
#[test]
fn test_raw_path_survives_normalisation() {
    let request = Request::get("https://app.test/assets/%2E%2E/admin/config.json?x=1").unwrap();

    assert_eq!(request.path(), "/admin/config.json");
    assert_eq!(request.raw_path(), "/assets/%2E%2E/admin/config.json");
}

#[test]
fn test_relative_precache_paths_resolve_against_origin() {
    let origin = "https://app.test".parse().unwrap();
    let request = Request::get_relative(&origin, "/assets/css/main.css").unwrap();

    assert_eq!(request.url().as_str(), "https://app.test/assets/css/main.css");
    assert!(request.is_http());
}

// ============================================================================
// Classification and strategy lookup
// ============================================================================

#[test]
fn test_declared_destination_beats_extension() {
    let request =
        Request::get("https://app.test/api/avatar?id=3").unwrap().with_destination("image");

    let declared = request.destination().map(ResourceClass::from_destination);
    assert_eq!(declared, Some(ResourceClass::Image));
    assert_eq!(ResourceClass::from_path(request.path()), ResourceClass::Other);
}

#[test]
fn test_configured_table_overrides_only_named_classes() {
    let config: Config =
        serde_json::from_str(r#"{"strategies":{"image":"cache-only","document":"network-only"}}"#)
            .unwrap();

    assert_eq!(config.strategies.get(ResourceClass::Image), Strategy::CacheOnly);
    assert_eq!(config.strategies.get(ResourceClass::Document), Strategy::NetworkOnly);
    assert_eq!(config.strategies.get(ResourceClass::Script), Strategy::NetworkFirst);
    assert_eq!(StrategyTable::default().get(ResourceClass::Script), Strategy::StaleWhileRevalidate);
}

// ============================================================================
// Verdicts and responses
// ============================================================================

#[test]
fn test_size_guard_serves_but_never_stores() {
    let verdict = SecurityVerdict::NoStore(DenialReason::CacheSizeExceeded {
        estimated_bytes: 60,
        limit_bytes: 50,
    });

    assert!(!verdict.is_allowed());
    assert!(verdict.may_serve());
    assert!(!verdict.may_store());
    assert_eq!(verdict.reason().map(DenialReason::kind), Some("cache_size_exceeded"));
}

#[test]
fn test_forbidden_response_is_not_cacheable() {
    let response = Response::forbidden("Forbidden");

    assert_eq!(response.status, 403);
    assert!(!response.is_ok());
    assert_eq!(response.source, ResponseSource::Forbidden);
    assert_eq!(response.headers.get("Cache-Control"), Some("no-store"));
}
