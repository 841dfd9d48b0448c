//! Domain-specific wrappers over [`OtelKit::trace_function`].
//!
//! Each helper pins the span name and a fixed set of attributes so call
//! sites across a code base produce the same field names.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use opentelemetry::{Context, KeyValue};

use crate::keys;
use crate::kit::OtelKit;

/// Business-operation type recorded by [`OtelKit::database_operation`].
pub const DATABASE_OPERATION: &str = "database_operation";

impl OtelKit {
    /// Trace a database call as span `db.<operation>`.
    ///
    /// Also logs start and completion at debug level (failure at error
    /// level) and counts the call as a `database_operation`.
    pub async fn database_operation<F, Fut, T, E>(
        &self,
        cx: &Context,
        operation: &str,
        table: &str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let fields = [
            KeyValue::new("operation", operation.to_string()),
            KeyValue::new("table", table.to_string()),
        ];
        self.log_debug(cx, "Database operation started", &fields);

        let start = Instant::now();
        let result = self
            .trace_function(
                cx,
                format!("db.{operation}"),
                &[
                    KeyValue::new(keys::db::OPERATION, operation.to_string()),
                    KeyValue::new(keys::db::TABLE, table.to_string()),
                    KeyValue::new(keys::db::TYPE, "unknown"),
                ],
                body,
            )
            .await;
        let duration_ms = millis(start.elapsed());

        let mut completion = fields.to_vec();
        completion.push(KeyValue::new("duration_ms", duration_ms));
        match &result {
            Ok(_) => self.log_debug(cx, "Database operation completed", &completion),
            Err(error) => {
                let error: &dyn Display = error;
                self.log_error(cx, "Database operation failed", Some(error), &completion)
            }
        }

        self.record_metric(
            DATABASE_OPERATION,
            1,
            &[
                KeyValue::new(keys::db::OPERATION, operation.to_string()),
                KeyValue::new(keys::db::TABLE, table.to_string()),
                KeyValue::new(keys::metric::SUCCESS, result.is_ok()),
            ],
        );

        result
    }

    /// Trace a cache call as span `cache.<operation>`.
    pub async fn cache_operation<F, Fut, T, E>(
        &self,
        cx: &Context,
        operation: &str,
        key: &str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.trace_function(
            cx,
            format!("cache.{operation}"),
            &[
                KeyValue::new(keys::cache::OPERATION, operation.to_string()),
                KeyValue::new(keys::cache::KEY, key.to_string()),
            ],
            body,
        )
        .await
    }

    /// Trace a call to another service as span `external.<service>.<operation>`.
    pub async fn external_service_call<F, Fut, T, E>(
        &self,
        cx: &Context,
        service: &str,
        operation: &str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.trace_function(
            cx,
            format!("external.{service}.{operation}"),
            &[
                KeyValue::new(keys::service::NAME, service.to_string()),
                KeyValue::new(keys::service::OPERATION, operation.to_string()),
            ],
            body,
        )
        .await
    }

    /// Trace a batch of `item_count` items as span `batch.<name>`.
    pub async fn batch_operation<F, Fut, T, E>(
        &self,
        cx: &Context,
        name: &str,
        item_count: usize,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.trace_function(
            cx,
            format!("batch.{name}"),
            &[
                KeyValue::new(keys::batch::OPERATION, name.to_string()),
                KeyValue::new(keys::batch::ITEM_COUNT, i64::try_from(item_count).unwrap_or(i64::MAX)),
            ],
            body,
        )
        .await
    }

    /// Trace `body` and report how long it took.
    ///
    /// The elapsed wall-clock time is returned and also set on the span as
    /// `operation.duration_ms` just before it ends.
    pub async fn timed_operation<F, Fut, T, E>(
        &self,
        cx: &Context,
        name: &str,
        body: F,
    ) -> (Duration, Result<T, E>)
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let start = Instant::now();
        let (scope, result) = self.run_in_span(cx, name.to_string(), &[], body).await;
        let elapsed = start.elapsed();

        scope.span().set_attribute(KeyValue::new(
            keys::operation::DURATION_MS,
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        ));
        drop(scope);

        (elapsed, result)
    }

    /// Trace `body` only when `enabled`; otherwise run it directly with `cx`.
    pub async fn conditional_trace<F, Fut, T, E>(
        &self,
        cx: &Context,
        enabled: bool,
        name: &str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if enabled {
            self.trace_function(cx, name.to_string(), &[], body).await
        } else {
            body(cx.clone()).await
        }
    }

    /// Trace a named request handler as span `http.<handler_name>`.
    pub async fn trace_http_handler<F, Fut, T, E>(
        &self,
        cx: &Context,
        handler_name: &str,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.trace_function(cx, format!("http.{handler_name}"), &[], body).await
    }
}

pub(crate) fn millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1e6
}
