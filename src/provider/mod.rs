//! Signal pipelines.
//!
//! # Data Flow
//! ```text
//! KitConfig
//!     → backend.rs (exporter names → closed enums)
//!     → resource.rs (service identity)
//!     → trace.rs   → SdkTracerProvider + tracer
//!     → metrics.rs → SdkMeterProvider + instruments (if enabled)
//!     → logs.rs    → SdkLoggerProvider + local JSON sink (if enabled)
//! ```
//!
//! # Design Decisions
//! - The three pipelines are independent; a disabled one is simply absent
//! - Nothing is registered as a process-wide global
//! - Exporter construction failures abort initialization immediately

pub mod backend;
pub mod logs;
pub mod metrics;
pub mod resource;
pub mod trace;

pub use backend::{LogsBackend, MetricsBackend, TraceBackend};
pub use metrics::Instruments;
