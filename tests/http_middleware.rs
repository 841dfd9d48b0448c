//! HTTP middleware tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use opentelemetry::logs::{AnyValue, Severity};
use opentelemetry::trace::{Status, TraceContextExt};
use opentelemetry::Value;
use prometheus::TextEncoder;
use tower::ServiceExt;

use otelkit::{http_middleware, metrics_handler, KitConfig, OtelKit, RequestContext};

mod common;
use common::{log_attr, span_attr, test_config, test_kit, test_kit_with, TestKit};

fn app(kit: Arc<OtelKit>) -> Router {
    Router::new()
        .route("/ok", get(|| async {}))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/users/{id}", get(|| async { "user" }))
        .route("/traced", get(traced))
        .with_state(kit.clone())
        .layer(middleware::from_fn_with_state(kit, http_middleware))
}

async fn traced(State(kit): State<Arc<OtelKit>>, RequestContext(cx): RequestContext) -> String {
    kit.trace_function(&cx, "handler.work", &[], |_| async { Ok::<_, String>(()) })
        .await
        .ok();
    cx.span().span_context().trace_id().to_string()
}

async fn send(t: &TestKit, uri: &str) -> StatusCode {
    let request = Request::builder()
        .uri(uri)
        .header("user-agent", "otelkit-test")
        .body(Body::empty())
        .unwrap();
    app(t.kit.clone()).oneshot(request).await.unwrap().status()
}

fn completion_logs(t: &TestKit) -> Vec<opentelemetry_sdk::logs::SdkLogRecord> {
    t.log_records()
        .into_iter()
        .filter(|record| record.body() == Some(&AnyValue::from("HTTP request completed".to_string())))
        .collect()
}

#[tokio::test]
async fn test_default_status_is_200() {
    let t = test_kit();

    assert_eq!(send(&t, "/ok").await, StatusCode::OK);

    let span = t.span_named("GET /ok");
    assert_eq!(span_attr(&span, "http.status_code"), Some(Value::I64(200)));
    assert_eq!(span_attr(&span, "http.status_text"), Some(Value::from("OK")));
    assert_eq!(span_attr(&span, "http.method"), Some(Value::from("GET")));
    assert_eq!(span_attr(&span, "http.user_agent"), Some(Value::from("otelkit-test")));
    assert!(span_attr(&span, "http.duration_ms").is_some());
    assert_eq!(span.status, Status::Unset);

    let started = t.log_with_body("HTTP request started");
    assert_eq!(started.severity_number(), Some(Severity::Info));
    assert_eq!(log_attr(&started, "path"), Some(AnyValue::from("/ok".to_string())));

    let completed = completion_logs(&t);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].severity_number(), Some(Severity::Info));
}

#[tokio::test]
async fn test_not_found_marks_span_and_warns() {
    let t = test_kit();

    assert_eq!(send(&t, "/missing").await, StatusCode::NOT_FOUND);

    let span = t.span_named("GET /missing");
    assert_eq!(span.status, Status::error("Not Found"));
    assert_eq!(span_attr(&span, "http.status_code"), Some(Value::I64(404)));

    let completed = completion_logs(&t);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].severity_number(), Some(Severity::Warn));
    assert_eq!(
        log_attr(&completed[0], "status_code"),
        Some(AnyValue::Int(404))
    );

    let failed = t.log_with_body("HTTP request failed");
    assert_eq!(failed.severity_number(), Some(Severity::Error));
}

#[tokio::test]
async fn test_server_error_logs_completion_and_failure() {
    let t = test_kit();

    assert_eq!(send(&t, "/broken").await, StatusCode::INTERNAL_SERVER_ERROR);

    let completed = completion_logs(&t);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].severity_number(), Some(Severity::Error));

    let failed = t.log_with_body("HTTP request failed");
    assert_eq!(failed.severity_number(), Some(Severity::Error));
    assert_eq!(log_attr(&failed, "status_code"), Some(AnyValue::Int(500)));
    assert_eq!(log_attr(&failed, "path"), Some(AnyValue::from("/broken".to_string())));

    assert_eq!(
        t.span_named("GET /broken").status,
        Status::error("Internal Server Error")
    );
}

#[tokio::test]
async fn test_route_uses_matched_path() {
    let t = test_kit();

    assert_eq!(send(&t, "/users/42").await, StatusCode::OK);

    let span = t.span_named("GET /users/42");
    assert_eq!(span_attr(&span, "http.route"), Some(Value::from("/users/{id}")));
    assert_eq!(span_attr(&span, "http.url"), Some(Value::from("/users/42")));
}

#[tokio::test]
async fn test_handler_spans_are_children_of_request_span() {
    let t = test_kit();

    let response = app(t.kit.clone())
        .oneshot(Request::builder().uri("/traced").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request_span = t.span_named("GET /traced");
    let handler_span = t.span_named("handler.work");
    assert_eq!(handler_span.parent_span_id, request_span.span_context.span_id());
}

#[tokio::test]
async fn test_inbound_traceparent_is_continued() {
    let t = test_kit();
    let request = Request::builder()
        .uri("/ok")
        .header(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )
        .body(Body::empty())
        .unwrap();

    app(t.kit.clone()).oneshot(request).await.unwrap();

    let span = t.span_named("GET /ok");
    assert_eq!(
        span.span_context.trace_id().to_string(),
        "4bf92f3577b34da6a3ce929d0e0e4736"
    );
    assert_eq!(span.parent_span_id.to_string(), "00f067aa0ba902b7");
}

#[tokio::test]
async fn test_request_context_outside_middleware_is_empty() {
    let app = Router::new().route(
        "/",
        get(|RequestContext(cx): RequestContext| async move {
            cx.span().span_context().is_valid().to_string()
        }),
    );

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"false");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let kit = Arc::new(
        OtelKit::new(KitConfig {
            metrics_exporter: "prometheus".into(),
            ..test_config()
        })
        .unwrap(),
    );
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(kit.clone())
        .layer(middleware::from_fn_with_state(kit.clone(), http_middleware));

    // The first scrape records a request the second one can see.
    let first = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("http_requests_total{"));
    assert!(text.contains("http_request_duration_seconds_bucket{"));
    assert!(text.contains(r#"method="GET""#));
    assert!(!text.contains("_total_total"));
    assert!(!text.contains("_seconds_seconds"));
}

fn active_spans(kit: &OtelKit) -> Option<f64> {
    let registry = kit.prometheus_registry()?;
    let text = TextEncoder::new().encode_to_string(&registry.gather()).ok()?;
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .find(|line| {
            line.strip_prefix("otelkit_active_spans")
                .is_some_and(|rest| rest.starts_with(|c| c == '{' || c == ' '))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

async fn report_active(State(kit): State<Arc<OtelKit>>) -> String {
    active_spans(&kit).map(|value| value.to_string()).unwrap_or_default()
}

async fn explode() -> StatusCode {
    panic!("handler exploded");
}

#[tokio::test]
async fn test_active_spans_gauge_tracks_in_flight_requests() {
    let t = test_kit_with(KitConfig {
        metrics_exporter: "prometheus".into(),
        ..test_config()
    });
    let app = Router::new()
        .route("/active", get(report_active))
        .route("/explode", get(explode))
        .with_state(t.kit.clone())
        .layer(middleware::from_fn_with_state(t.kit.clone(), http_middleware));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/active").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"1");
    assert_eq!(active_spans(&t.kit), Some(0.0));

    let handle = tokio::spawn(async move {
        app.oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
    });
    assert!(handle.await.unwrap_err().is_panic());
    assert_eq!(active_spans(&t.kit), Some(0.0));

    let span = t.span_named("GET /explode");
    assert_eq!(span_attr(&span, "http.route"), Some(Value::from("/explode")));
}

#[tokio::test]
async fn test_metrics_endpoint_without_prometheus_is_404() {
    let kit = Arc::new(OtelKit::new(test_config()).unwrap());
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(kit);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
