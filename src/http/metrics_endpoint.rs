//! Prometheus scrape endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::TextEncoder;

use crate::kit::OtelKit;

/// Render the kit's Prometheus registry in the text exposition format.
///
/// Responds 404 when the Prometheus backend is not selected.
pub async fn metrics_handler(State(kit): State<Arc<OtelKit>>) -> Response {
    let Some(registry) = kit.prometheus_registry() else {
        return (StatusCode::NOT_FOUND, "Prometheus exporter not enabled").into_response();
    };

    match TextEncoder::new().encode_to_string(&registry.gather()) {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
