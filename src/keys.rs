//! Attribute keys.
//!
//! Every key the kit writes lives here, grouped by dotted namespace, so that
//! call sites cannot drift apart.

pub mod http {
    pub const METHOD: &str = "http.method";
    pub const URL: &str = "http.url";
    pub const ROUTE: &str = "http.route";
    pub const USER_AGENT: &str = "http.user_agent";
    pub const REMOTE_ADDR: &str = "http.remote_addr";
    pub const STATUS_CODE: &str = "http.status_code";
    pub const STATUS_TEXT: &str = "http.status_text";
    pub const DURATION_MS: &str = "http.duration_ms";
}

pub mod db {
    pub const OPERATION: &str = "db.operation";
    pub const TABLE: &str = "db.table";
    pub const TYPE: &str = "db.type";
}

pub mod cache {
    pub const OPERATION: &str = "cache.operation";
    pub const KEY: &str = "cache.key";
}

pub mod service {
    pub const NAME: &str = "service.name";
    pub const VERSION: &str = "service.version";
    pub const OPERATION: &str = "service.operation";
}

pub mod batch {
    pub const OPERATION: &str = "batch.operation";
    pub const ITEM_COUNT: &str = "batch.item_count";
}

pub mod operation {
    pub const DURATION_MS: &str = "operation.duration_ms";
}

pub mod deployment {
    pub const ENVIRONMENT_NAME: &str = "deployment.environment.name";
}

/// Metric dimension keys.
pub mod metric {
    pub const METHOD: &str = "method";
    pub const STATUS_CODE: &str = "status_code";
    pub const OPERATION_TYPE: &str = "operation_type";
    pub const SUCCESS: &str = "success";
}

/// Correlation keys added to exported log records.
pub mod log {
    pub const TRACE_ID: &str = "trace_id";
    pub const SPAN_ID: &str = "span_id";
    pub const ERROR: &str = "error";
}

/// Recorded-error event.
pub mod exception {
    pub const EVENT_NAME: &str = "exception";
    pub const MESSAGE: &str = "exception.message";
}
