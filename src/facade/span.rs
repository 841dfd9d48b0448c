//! Span lifecycle and ambient span mutation.
//!
//! # Responsibilities
//! - Start spans as children of an explicit [`Context`]
//! - Run a body inside a span and end the span exactly once
//! - Mark spans as failed when the body returns an error
//! - Mutate whatever span a context carries (or do nothing if none)

use std::borrow::Cow;
use std::fmt::Display;
use std::future::Future;

use opentelemetry::trace::{SpanRef, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};

use crate::keys;
use crate::kit::OtelKit;

/// Owns a context whose span is ended when the scope is dropped.
///
/// Dropping happens on every exit path, including unwinding out of a
/// panicking body. Ending an already ended span is a no-op.
pub(crate) struct SpanScope {
    cx: Context,
}

impl SpanScope {
    pub(crate) fn new(cx: Context) -> Self {
        Self { cx }
    }

    pub(crate) fn context(&self) -> &Context {
        &self.cx
    }

    pub(crate) fn span(&self) -> SpanRef<'_> {
        self.cx.span()
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}

/// Record `error` on `span` and set its status to error.
pub(crate) fn mark_error(span: &SpanRef<'_>, error: &dyn Display) {
    let message = error.to_string();
    span.add_event(
        keys::exception::EVENT_NAME,
        vec![KeyValue::new(keys::exception::MESSAGE, message.clone())],
    );
    span.set_status(Status::error(message));
}

impl OtelKit {
    /// Start a span as a child of `parent` and return the context carrying it.
    ///
    /// The caller owns the span and must end it, e.g. with
    /// `cx.span().end()`.
    pub fn start_span(
        &self,
        parent: &Context,
        name: impl Into<Cow<'static, str>>,
        attributes: &[KeyValue],
    ) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_attributes(attributes.to_vec())
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    /// Run `body` inside a span named `name`.
    ///
    /// The body receives the child context. An error from the body is recorded
    /// on the span, sets its status to error, and is returned unchanged.
    /// Success leaves the status unset.
    pub async fn trace_function<F, Fut, T, E>(
        &self,
        cx: &Context,
        name: impl Into<Cow<'static, str>>,
        attributes: &[KeyValue],
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let (_scope, result) = self.run_in_span(cx, name, attributes, body).await;
        result
    }

    /// Like [`trace_function`](Self::trace_function) but hands back the
    /// still-open span scope so the caller can add final attributes.
    pub(crate) async fn run_in_span<F, Fut, T, E>(
        &self,
        cx: &Context,
        name: impl Into<Cow<'static, str>>,
        attributes: &[KeyValue],
        body: F,
    ) -> (SpanScope, Result<T, E>)
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let scope = SpanScope::new(self.start_span(cx, name, attributes));
        let result = body(scope.context().clone()).await;

        if let Err(error) = &result {
            mark_error(&scope.span(), error);
        }

        (scope, result)
    }

    /// Add an event to the span carried by `cx`.
    pub fn add_event(&self, cx: &Context, name: impl Into<Cow<'static, str>>, attributes: &[KeyValue]) {
        cx.span().add_event(name, attributes.to_vec());
    }

    /// Set attributes on the span carried by `cx`.
    pub fn set_attributes(&self, cx: &Context, attributes: &[KeyValue]) {
        cx.span().set_attributes(attributes.to_vec());
    }

    /// Record `error` on the span carried by `cx` and mark it failed.
    pub fn record_error(&self, cx: &Context, error: &dyn Display) {
        mark_error(&cx.span(), error);
    }
}
