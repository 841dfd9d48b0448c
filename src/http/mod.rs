//! HTTP integration for axum.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → middleware.rs (extract traceparent, start span, log start)
//!     → handler (RequestContext extractor → façade calls)
//!     → middleware.rs (status, duration, metrics, completion log, end span)
//!     → Send to client
//!
//! GET /metrics → metrics_endpoint.rs (Prometheus text format)
//! ```

pub mod metrics_endpoint;
pub mod middleware;

pub use metrics_endpoint::metrics_handler;
pub use middleware::{http_middleware, RequestContext};
