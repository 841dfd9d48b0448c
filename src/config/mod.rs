//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ConfigOverrides (code or TOML file)
//!     → loader.rs (override > environment > default)
//!     → KitConfig (fully populated, immutable)
//!     → validation.rs (semantic checks, run by OtelKit::new)
//!     → provider pipelines
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; there is no reload path
//! - All fields have defaults so resolution is total
//! - Validation separates resolution (never fails) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve, resolve_with, ConfigError};
pub use schema::{ConfigOverrides, KitConfig, LogLevel};
pub use validation::{validate_config, ValidationError};
