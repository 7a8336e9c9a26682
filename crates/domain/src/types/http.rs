//! HTTP request/response model
//!
//! A deliberately small model: the cache engine only needs identity (method +
//! URL), a handful of headers and the body bytes. Adapters translate to and
//! from real HTTP stacks.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::errors::{LanternError, Result};

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl Method {
    /// Convert to the canonical upper-case token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = LanternError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "OPTIONS" => Ok(Self::Options),
            other => Err(LanternError::InvalidInput(format!("unsupported method: {other}"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Create an empty header list
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Whether a header named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace every value of `name` with `value`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.0.push((name, value.into()));
    }

    /// Add a value without removing existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An intercepted outgoing request.
///
/// The raw URL text is kept next to the parsed [`Url`] because URL parsing
/// normalises `..` and `%2e%2e` segments away, and the security filter has to
/// see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    raw_url: String,
    url: Url,
    method: Method,
    headers: Headers,
    destination: Option<String>,
    body: Vec<u8>,
}

impl Request {
    /// Build a request from an absolute URL.
    ///
    /// # Errors
    /// Returns `LanternError::InvalidInput` if `raw_url` is not an absolute
    /// URL.
    pub fn new(method: Method, raw_url: impl Into<String>) -> Result<Self> {
        let raw_url = raw_url.into();
        let url = Url::parse(&raw_url)
            .map_err(|e| LanternError::InvalidInput(format!("invalid url '{raw_url}': {e}")))?;
        Ok(Self {
            raw_url,
            url,
            method,
            headers: Headers::new(),
            destination: None,
            body: Vec::new(),
        })
    }

    /// Shorthand for a GET request.
    pub fn get(raw_url: impl Into<String>) -> Result<Self> {
        Self::new(Method::Get, raw_url)
    }

    /// GET request for `path` resolved against `base` (absolute URLs are kept
    /// as they are).
    pub fn get_relative(base: &Url, path: &str) -> Result<Self> {
        let url = base
            .join(path)
            .map_err(|e| LanternError::InvalidInput(format!("invalid path '{path}': {e}")))?;
        Self::get(url.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the declared destination (`document`, `image`, ...).
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Attach a body; only forwarded requests carry one.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL exactly as the caller supplied it.
    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Declared destination, `None` when absent or empty.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref().filter(|d| !d.is_empty())
    }

    /// Whether the scheme is `http` or `https`.
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    /// Normalised path of the parsed URL.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Path portion of the raw URL text, before any normalisation.
    pub fn raw_path(&self) -> &str {
        let after_scheme = match self.raw_url.find("://") {
            Some(idx) => &self.raw_url[idx + 3..],
            None => self.raw_url.as_str(),
        };
        // The authority ends at the first '/', '?' or '#'.
        let path = match after_scheme.find(['/', '?', '#']) {
            Some(idx) if after_scheme[idx..].starts_with('/') => &after_scheme[idx..],
            _ => "",
        };
        let end = path.find(['?', '#']).unwrap_or(path.len());
        &path[..end]
    }

    /// Whether the `Accept` header asks for HTML.
    pub fn accepts_html(&self) -> bool {
        self.headers.get("accept").is_some_and(|accept| accept.contains("text/html"))
    }

    /// ASCII serialisation of the request origin (`scheme://host[:port]`).
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }
}

/// Who produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseSource {
    #[default]
    Network,
    Cache,
    Fallback,
    Forbidden,
}

/// A response as stored in, or served from, the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub source: ResponseSource,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: Headers::new(),
            body: body.into(),
            source: ResponseSource::Network,
        }
    }

    /// 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// 200 `text/html` response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::ok(body.into().into_bytes()).with_header("content-type", "text/html; charset=utf-8")
    }

    /// 200 `image/svg+xml` response.
    pub fn svg(body: impl Into<String>) -> Self {
        Self::ok(body.into().into_bytes()).with_header("content-type", "image/svg+xml")
    }

    /// 404 plain-text response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(404, body.into().into_bytes())
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// 403 response produced by the security filter.
    pub fn forbidden(body: impl Into<String>) -> Self {
        Self::new(403, body.into().into_bytes())
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_header("cache-control", "no-store")
            .with_source(ResponseSource::Forbidden)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Status in the 200..=299 range.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Body size in bytes.
    pub fn body_len(&self) -> u64 {
        self.body.len() as u64
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

/// Identity of a cache entry: method plus absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    method: Method,
    url: String,
}

impl CacheKey {
    /// Key for `request`, or `None` when the request is not cacheable (only
    /// GET is).
    pub fn for_request(request: &Request) -> Option<Self> {
        if request.method() != Method::Get {
            return None;
        }
        let mut url = request.url().clone();
        url.set_fragment(None);
        Some(Self { method: Method::Get, url: url.to_string() })
    }

    /// Key for a GET of `url`.
    ///
    /// # Errors
    /// Returns `LanternError::InvalidInput` if `url` is not absolute.
    pub fn get(url: &str) -> Result<Self> {
        let request = Request::get(url)?;
        Self::for_request(&request)
            .ok_or_else(|| LanternError::Internal("GET request without cache key".into()))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
