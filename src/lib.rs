//! Traces, metrics and logs for a service behind one handle.
//!
//! # Data Flow
//! ```text
//! ConfigOverrides + environment → config::resolve → KitConfig
//!     → OtelKit::new (validate, build providers)
//!     → façade calls (explicit Context) / http_middleware
//!     → OtelKit::shutdown(timeout)
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod http;
pub mod keys;
pub mod kit;
pub mod lifecycle;
pub mod provider;

pub use config::{ConfigOverrides, KitConfig, LogLevel};
pub use error::{KitError, ShutdownError, Signal};
pub use http::{http_middleware, metrics_handler, RequestContext};
pub use kit::{KitBuilder, OtelKit};
pub use lifecycle::shutdown_signal;
pub use opentelemetry::{Context, KeyValue};
