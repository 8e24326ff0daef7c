//! Per-call request context.
//!
//! # Design
//! A `RequestContext` travels with a single operation. It bounds the call in
//! time (deadline, cancellation) and carries the trace it belongs to, plus an
//! optional propagator that overrides the client's default for this call
//! only. Contexts are cheap to clone and hold no state shared with the client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanContext, TraceContextExt};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Shared handle to a trace-context propagator.
pub type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// Cloneable signal that aborts every call holding a copy of it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

#[derive(Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancellation: Option<CancellationToken>,
    trace: opentelemetry::Context,
    propagator: Option<SharedPropagator>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("deadline", &self.deadline)
            .field("cancellation", &self.cancellation)
            .field("has_active_span", &self.has_active_span())
            .field("propagator", &self.propagator)
            .finish()
    }
}

impl RequestContext {
    /// A context with no deadline, no cancellation and no trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying the OpenTelemetry context of the current `tracing` span.
    pub fn from_current_span() -> Self {
        Self::new().with_trace_context(tracing::Span::current().context())
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_trace_context(mut self, trace: opentelemetry::Context) -> Self {
        self.trace = trace;
        self
    }

    /// Attach a remote span so outgoing requests continue that trace.
    pub fn with_remote_span_context(self, span_context: SpanContext) -> Self {
        let trace = self.trace.with_remote_span_context(span_context);
        self.with_trace_context(trace)
    }

    /// Override the client's default propagator for calls using this context.
    pub fn with_propagator(mut self, propagator: SharedPropagator) -> Self {
        self.propagator = Some(propagator);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn trace_context(&self) -> &opentelemetry::Context {
        &self.trace
    }

    pub fn propagator(&self) -> Option<&SharedPropagator> {
        self.propagator.as_ref()
    }

    /// True when the context holds a span with a valid span context.
    pub fn has_active_span(&self) -> bool {
        self.trace.has_active_span() && self.trace.span().span_context().is_valid()
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::{SpanId, TraceFlags, TraceId, TraceState};

    use super::*;

    #[test]
    fn new_context_is_unbounded_and_untraced() {
        let ctx = RequestContext::new();
        assert!(ctx.deadline().is_none());
        assert!(ctx.cancellation().is_none());
        assert!(ctx.propagator().is_none());
        assert!(!ctx.has_active_span());
    }

    #[test]
    fn remote_span_context_is_active() {
        let span_context = SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let ctx = RequestContext::new().with_remote_span_context(span_context);
        assert!(ctx.has_active_span());
    }

    #[test]
    fn invalid_span_context_is_not_active() {
        let ctx = RequestContext::new().with_remote_span_context(SpanContext::empty_context());
        assert!(!ctx.has_active_span());
    }

    #[test]
    fn current_span_without_otel_layer_is_untraced() {
        let ctx = RequestContext::from_current_span();
        assert!(!ctx.has_active_span());
    }

    #[tokio::test]
    async fn with_timeout_sets_future_deadline() {
        let before = Instant::now();
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        assert!(ctx.deadline().unwrap() > before);
    }

    #[tokio::test]
    async fn cancel_is_seen_by_every_clone() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        token.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_after_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
    }
}
