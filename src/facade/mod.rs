//! Instrumentation façade.
//!
//! # Data Flow
//! ```text
//! caller (explicit Context)
//!     → span.rs     (trace_function: start span → run body → mark error → end)
//!     → helpers.rs  (db / cache / external / batch / timed / conditional)
//!     → logging.rs  (local JSON sink + exported log record)
//!     → metrics.rs  (business counter, HTTP metrics, active-span gauge)
//! ```
//!
//! # Design Decisions
//! - Context is passed explicitly; nothing reads a global tracer
//! - Calls on a context without a span are silent no-ops
//! - Body errors are recorded, never transformed; telemetry failures are
//!   never surfaced to the caller

pub mod helpers;
pub mod logging;
pub mod metrics;
pub mod span;

pub use helpers::DATABASE_OPERATION;
pub use metrics::ActiveSpanGuard;
