//! Leveled logging with trace correlation.
//!
//! # Data Flow
//! ```text
//! log_info / log_warn / log_error / log_debug
//!     → level check against KitConfig::log_level
//!     → local JSON sink (one line per record, attributes as fields)
//!     → OpenTelemetry log record (if the log pipeline is enabled)
//!         + trace_id / span_id when the context carries a valid span
//! ```

use std::fmt::Display;
use std::time::SystemTime;

use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, Severity};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue, Value};

use crate::config::LogLevel;
use crate::keys;
use crate::kit::OtelKit;
use crate::provider::logs::LocalRecord;

impl OtelKit {
    pub fn log_info(&self, cx: &Context, message: &str, attributes: &[KeyValue]) {
        self.log(LogLevel::Info, cx, message, None, attributes);
    }

    pub fn log_warn(&self, cx: &Context, message: &str, attributes: &[KeyValue]) {
        self.log(LogLevel::Warn, cx, message, None, attributes);
    }

    pub fn log_debug(&self, cx: &Context, message: &str, attributes: &[KeyValue]) {
        self.log(LogLevel::Debug, cx, message, None, attributes);
    }

    /// Log at error level. `error` may be `None` when the failure has no
    /// underlying error value (an HTTP status, for example).
    pub fn log_error(
        &self,
        cx: &Context,
        message: &str,
        error: Option<&dyn Display>,
        attributes: &[KeyValue],
    ) {
        let error = error.map(ToString::to_string);
        self.log(LogLevel::Error, cx, message, error.as_deref(), attributes);
    }

    pub(crate) fn log(
        &self,
        level: LogLevel,
        cx: &Context,
        message: &str,
        error: Option<&str>,
        attributes: &[KeyValue],
    ) {
        if level < self.config.log_level {
            return;
        }

        let span_context = cx.span().span_context().clone();
        let (trace_id, span_id) = if span_context.is_valid() {
            (
                Some(span_context.trace_id().to_string()),
                Some(span_context.span_id().to_string()),
            )
        } else {
            (None, None)
        };

        self.write_local(level, message, error, attributes, trace_id.as_deref(), span_id.as_deref());

        let Some(logs) = &self.logs else {
            return;
        };

        let now = SystemTime::now();
        let mut record = logs.logger.create_log_record();
        record.set_timestamp(now);
        record.set_observed_timestamp(now);
        record.set_severity_number(severity(level));
        record.set_severity_text(severity_text(level));
        record.set_body(AnyValue::from(message.to_string()));
        for attribute in attributes {
            record.add_attribute(attribute.key.clone(), any_value(&attribute.value));
        }
        if let Some(error) = error {
            record.add_attribute(keys::log::ERROR, error.to_string());
        }
        if let (Some(trace_id), Some(span_id)) = (trace_id, span_id) {
            record.add_attribute(keys::log::TRACE_ID, trace_id);
            record.add_attribute(keys::log::SPAN_ID, span_id);
        }

        // The SDK copies the active span's context onto the record.
        let _attached = cx.clone().attach();
        logs.logger.emit(record);
    }

    fn write_local(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&str>,
        attributes: &[KeyValue],
        trace_id: Option<&str>,
        span_id: Option<&str>,
    ) {
        self.local_sink.write(LocalRecord {
            level,
            message,
            error,
            trace_id,
            span_id,
            fields: attribute_fields(attributes),
        });
    }
}

fn severity(level: LogLevel) -> Severity {
    match level {
        LogLevel::Debug => Severity::Debug,
        LogLevel::Info => Severity::Info,
        LogLevel::Warn => Severity::Warn,
        LogLevel::Error => Severity::Error,
    }
}

fn severity_text(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "DEBUG",
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn any_value(value: &Value) -> AnyValue {
    match value {
        Value::Bool(b) => AnyValue::Boolean(*b),
        Value::I64(i) => AnyValue::Int(*i),
        Value::F64(f) => AnyValue::Double(*f),
        Value::String(s) => AnyValue::String(s.clone()),
        other => AnyValue::from(other.to_string()),
    }
}

fn attribute_fields(attributes: &[KeyValue]) -> serde_json::Map<String, serde_json::Value> {
    attributes
        .iter()
        .map(|kv| (kv.key.to_string(), json_value(&kv.value)))
        .collect()
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I64(i) => serde_json::Value::from(*i),
        Value::F64(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.as_str().to_string()),
        other => serde_json::Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_render_as_json_fields() {
        let rendered = attribute_fields(&[
            KeyValue::new("user", "ada"),
            KeyValue::new("count", 3),
            KeyValue::new("ratio", 0.5),
            KeyValue::new("critical", true),
        ]);

        assert_eq!(
            serde_json::Value::Object(rendered),
            serde_json::json!({"user": "ada", "count": 3, "ratio": 0.5, "critical": true})
        );
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(json_value(&Value::F64(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn any_value_keeps_scalar_types() {
        assert_eq!(any_value(&Value::I64(7)), AnyValue::Int(7));
        assert_eq!(any_value(&Value::Bool(false)), AnyValue::Boolean(false));
        assert_eq!(any_value(&Value::from("x")), AnyValue::from("x"));
    }
}
