//! Request-lifecycle middleware.
//!
//! # Responsibilities
//! - Extract W3C trace context from inbound headers
//! - Wrap each request in a `"<METHOD> <path>"` span
//! - Log request start and completion with trace correlation
//! - Record request count and latency metrics
//! - Classify 4xx/5xx responses as failures
//!
//! # Design Decisions
//! - The response status is the one the handler produced; axum defaults it
//!   to 200 when nothing else is set
//! - No timeout is imposed; cancellation comes from the host server
//! - The span is ended by a scope guard, so a panicking handler still ends it

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, MatchedPath, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::Status;
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;

use crate::config::LogLevel;
use crate::facade::helpers::millis;
use crate::facade::span::SpanScope;
use crate::keys;
use crate::kit::OtelKit;

/// The traced context of the current request.
///
/// Inserted by [`http_middleware`]; handlers extract it to parent their own
/// spans. Outside the middleware it is an empty context.
#[derive(Clone, Debug, Default)]
pub struct RequestContext(pub Context);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Middleware function tracing, logging and measuring every request.
///
/// Install with `axum::middleware::from_fn_with_state(kit, http_middleware)`.
pub async fn http_middleware(
    State(kit): State<Arc<OtelKit>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let url = request.uri().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let parent = TraceContextPropagator::new().extract(&HeaderExtractor(request.headers()));

    let scope = SpanScope::new(kit.start_span(
        &parent,
        format!("{method} {path}"),
        &[
            KeyValue::new(keys::http::METHOD, method.clone()),
            KeyValue::new(keys::http::URL, url),
            KeyValue::new(keys::http::ROUTE, route),
            KeyValue::new(keys::http::USER_AGENT, user_agent.clone()),
            KeyValue::new(keys::http::REMOTE_ADDR, remote_addr.clone()),
        ],
    ));
    let cx = scope.context().clone();
    let _active = kit.track_active_span();

    kit.log_info(
        &cx,
        "HTTP request started",
        &[
            KeyValue::new("method", method.clone()),
            KeyValue::new("path", path.clone()),
            KeyValue::new("user_agent", user_agent),
            KeyValue::new("remote_addr", remote_addr),
        ],
    );

    request.extensions_mut().insert(RequestContext(cx.clone()));
    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    let status_code = status.as_u16();
    let status_text = status.canonical_reason().unwrap_or_default();
    let duration_ms = millis(duration);

    let span = scope.span();
    span.set_attributes([
        KeyValue::new(keys::http::STATUS_CODE, i64::from(status_code)),
        KeyValue::new(keys::http::STATUS_TEXT, status_text),
        KeyValue::new(keys::http::DURATION_MS, duration_ms),
    ]);
    if status_code >= 400 {
        span.set_status(Status::error(status_text));
    }

    kit.record_http_metrics(&method, status_code, duration);

    let level = match status_code {
        500.. => LogLevel::Error,
        400..=499 => LogLevel::Warn,
        _ => LogLevel::Info,
    };
    kit.log(
        level,
        &cx,
        "HTTP request completed",
        None,
        &[
            KeyValue::new("method", method),
            KeyValue::new("path", path.clone()),
            KeyValue::new("status_code", i64::from(status_code)),
            KeyValue::new("status_text", status_text),
            KeyValue::new("duration_ms", duration_ms),
        ],
    );

    if status_code >= 400 {
        kit.log_error(
            &cx,
            "HTTP request failed",
            None,
            &[
                KeyValue::new("status_code", i64::from(status_code)),
                KeyValue::new("path", path),
            ],
        );
    }

    response
}
