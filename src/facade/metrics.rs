//! Metric recording on the kit's pre-registered instruments.
//!
//! All calls are no-ops when the metrics pipeline is disabled.

use std::time::Duration;

use opentelemetry::metrics::UpDownCounter;
use opentelemetry::KeyValue;

use crate::keys;
use crate::kit::OtelKit;

impl OtelKit {
    /// Add `value` to the business-operation counter, tagged with
    /// `operation_type = operation` plus `attributes`.
    pub fn record_metric(&self, operation: &str, value: u64, attributes: &[KeyValue]) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let mut tags = attributes.to_vec();
        tags.push(KeyValue::new(keys::metric::OPERATION_TYPE, operation.to_string()));
        metrics.instruments.business_operations.add(value, &tags);
    }

    /// Count one HTTP request and record its duration in seconds.
    pub fn record_http_metrics(&self, method: &str, status_code: u16, duration: Duration) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let tags = [
            KeyValue::new(keys::metric::METHOD, method.to_string()),
            KeyValue::new(keys::metric::STATUS_CODE, status_code.to_string()),
        ];
        metrics.instruments.http_requests_total.add(1, &tags);
        metrics
            .instruments
            .http_request_duration
            .record(duration.as_secs_f64(), &tags);
    }

    /// Count one in-flight operation until the returned guard is dropped.
    pub fn track_active_span(&self) -> ActiveSpanGuard {
        let counter = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.instruments.active_spans.clone());
        if let Some(counter) = &counter {
            counter.add(1, &[]);
        }
        ActiveSpanGuard { counter }
    }
}

/// A RAII guard that keeps the active-span gauge incremented.
pub struct ActiveSpanGuard {
    counter: Option<UpDownCounter<i64>>,
}

impl Drop for ActiveSpanGuard {
    fn drop(&mut self) {
        if let Some(counter) = &self.counter {
            counter.add(-1, &[]);
        }
    }
}
