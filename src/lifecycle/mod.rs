//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (OtelKit::new):
//!     Resolve config → Validate → Resource → Traces → Metrics → Logs
//!
//! Shutdown (shutdown.rs):
//!     OtelKit::shutdown(timeout) → close each provider concurrently
//!     → collect per-signal failures → one ShutdownError
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → host application stops serving → OtelKit::shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown never short-circuits; every provider gets its chance to flush
//! - Shutdown has a caller-supplied deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::ShutdownCoordinator;
pub use signals::shutdown_signal;
