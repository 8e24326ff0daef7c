//! Distributed-tracing header injection.
//!
//! Injection is best effort: a missing span, a propagator that writes a
//! header name or value HTTP cannot carry, or a propagator that writes
//! nothing all leave the request usable and never fail the call.

use opentelemetry::propagation::{Injector, TextMapPropagator};
use reqwest::header::{HeaderName, HeaderValue};

use crate::context::RequestContext;
use crate::http::HttpRequest;

/// Pick the propagator for a call: the context override, else the default.
pub fn select_propagator<'a>(
    ctx: &'a RequestContext,
    default: &'a (dyn TextMapPropagator + Send + Sync),
) -> &'a (dyn TextMapPropagator + Send + Sync) {
    match ctx.propagator() {
        Some(propagator) => propagator.as_ref(),
        None => default,
    }
}

/// Write the context's trace headers into `request`.
pub fn inject_tracing_headers(
    ctx: &RequestContext,
    default: &(dyn TextMapPropagator + Send + Sync),
    request: &mut HttpRequest,
) {
    if !ctx.has_active_span() {
        return;
    }

    let propagator = select_propagator(ctx, default);
    let mut carrier = HeaderCarrier { request };
    propagator.inject_context(ctx.trace_context(), &mut carrier);
}

/// Adapts an `HttpRequest` header list to the OpenTelemetry `Injector` API.
struct HeaderCarrier<'a> {
    request: &'a mut HttpRequest,
}

impl Injector for HeaderCarrier<'_> {
    fn set(&mut self, key: &str, value: String) {
        // Drop anything the transport would reject instead of failing the call later.
        if HeaderName::from_bytes(key.as_bytes()).is_err() || HeaderValue::from_str(&value).is_err()
        {
            return;
        }
        self.request.set_header(key, value);
    }
}
