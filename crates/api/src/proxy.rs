//! Caching reverse proxy
//!
//! Every incoming request becomes a domain [`Request`] addressed to the
//! public application origin and goes through the host's fetch hook.
//! Requests the cache manager does not intercept are forwarded to the
//! upstream through the network port unchanged.
//!
//! Two endpoints are reserved for the control channel:
//! - `POST /__lantern/message` takes a JSON [`ControlMessage`] and answers
//!   with the JSON [`ControlReply`](lantern_domain::ControlReply), or
//!   `204 No Content` for messages without a reply
//! - `GET /__lantern/health` reports [`HealthStatus`]

use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::extract::{Request as HttpRequest, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use lantern_core::NetworkFetcher;
use lantern_domain::{ControlMessage, Headers, LanternError, Method, Request, Response, Result};
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::host::{MessageEvent, ServiceWorkerHost};
use crate::utils::health::{self, HealthStatus};
use crate::utils::logging::{log_request_outcome, source_label};

pub const CONTROL_PATH: &str = "/__lantern/message";
pub const HEALTH_PATH: &str = "/__lantern/health";

/// Response header naming who produced the response.
pub const SOURCE_HEADER: &str = "x-lantern-source";

const PASSTHROUGH: &str = "passthrough";
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Failures answered with an error status instead of a proxied response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("bad request: {0}")]
    BadRequest(LanternError),

    #[error("upstream unavailable: {0}")]
    Upstream(LanternError),

    #[error("control message failed: {0}")]
    Control(LanternError),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Control(LanternError::InvalidInput(_) | LanternError::Config(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Control(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_error(self) -> LanternError {
        match self {
            Self::MethodNotAllowed(method) => {
                LanternError::InvalidInput(format!("unsupported method: {method}"))
            }
            Self::BadRequest(err) | Self::Upstream(err) | Self::Control(err) => err,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> HttpResponse {
        let status = self.status();
        (status, Json(self.into_error())).into_response()
    }
}

#[derive(Clone)]
struct ProxyState {
    host: Arc<ServiceWorkerHost>,
    network: Arc<dyn NetworkFetcher>,
    public_origin: String,
}

/// Build the proxy router over the context's host and network port.
///
/// # Errors
/// Returns `LanternError::Config` when the application origin is invalid.
pub fn router(context: &AppContext) -> Result<Router> {
    let state = ProxyState {
        host: Arc::clone(&context.host),
        network: context.network.clone(),
        public_origin: context.config.app_origin()?.origin().ascii_serialization(),
    };

    Ok(Router::new()
        .route(CONTROL_PATH, post(control))
        .route(HEALTH_PATH, get(health_report))
        .fallback(intercept)
        .with_state(state))
}

async fn intercept(State(state): State<ProxyState>, request: HttpRequest) -> HttpResponse {
    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    match proxy(&state, request).await {
        Ok((response, intercepted)) => {
            let source = intercepted.then_some(response.source);
            log_request_outcome(&method, &path, response.status, source, started.elapsed());
            let label = if intercepted { source_label(response.source) } else { PASSTHROUGH };
            into_http_response(response, label)
        }
        Err(err) => {
            let status = err.status();
            warn!(method = %method, path = %path, error = %err, "request not proxied");
            log_request_outcome(&method, &path, status.as_u16(), None, started.elapsed());
            err.into_response()
        }
    }
}

/// Returns the response and whether the cache manager produced it.
async fn proxy(
    state: &ProxyState,
    request: HttpRequest,
) -> std::result::Result<(Response, bool), ProxyError> {
    let request = to_domain_request(&state.public_origin, request).await?;

    if let Some(response) = state.host.on_fetch(&request).await {
        return Ok((response, true));
    }

    let response = state.network.fetch(&request).await.map_err(ProxyError::Upstream)?;
    Ok((response, false))
}

async fn to_domain_request(
    origin: &str,
    request: HttpRequest,
) -> std::result::Result<Request, ProxyError> {
    let (parts, body) = request.into_parts();

    let method: Method = parts
        .method
        .as_str()
        .parse()
        .map_err(|_| ProxyError::MethodNotAllowed(parts.method.to_string()))?;
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let mut domain =
        Request::new(method, format!("{origin}{path_and_query}")).map_err(ProxyError::BadRequest)?;

    let mut headers = Headers::new();
    for (name, value) in &parts.headers {
        if name == header::HOST {
            continue;
        }
        match value.to_str() {
            Ok(value) => headers.append(name.as_str(), value),
            Err(_) => debug!(header = %name, "dropping non-ASCII request header"),
        }
    }
    let destination = headers.get("sec-fetch-dest").map(str::to_string);
    domain = domain.with_headers(headers);
    if let Some(destination) = destination {
        domain = domain.with_destination(destination);
    }

    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|err| {
        ProxyError::BadRequest(LanternError::InvalidInput(format!("unreadable request body: {err}")))
    })?;
    if !body.is_empty() {
        domain = domain.with_body(body.to_vec());
    }

    Ok(domain)
}

fn into_http_response(response: Response, source: &'static str) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    for (name, value) in response.headers.iter() {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = name, "dropping invalid response header"),
        }
    }
    headers.insert(HeaderName::from_static(SOURCE_HEADER), HeaderValue::from_static(source));

    (status, headers, Body::from(response.body)).into_response()
}

async fn control(
    State(state): State<ProxyState>,
    Json(message): Json<ControlMessage>,
) -> std::result::Result<HttpResponse, ProxyError> {
    let (event, reply) = MessageEvent::with_reply(message);
    state.host.on_message(event).await.map_err(ProxyError::Control)?;

    Ok(match reply.await {
        Ok(reply) => Json(reply).into_response(),
        Err(_) => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn health_report(State(state): State<ProxyState>) -> (StatusCode, Json<HealthStatus>) {
    let status = health::check(state.host.manager()).await;
    let code = if status.is_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status))
}
