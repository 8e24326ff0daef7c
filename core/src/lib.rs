//! Async client for the Zaya link-shortening API.
//!
//! # Overview
//! Builds authenticated requests, executes them over a shared reqwest
//! transport, and normalises every failure (transport error, missing
//! response, structured error body, plain-text body) into one `ApiError`.
//!
//! # Design
//! - `ZayaClient` owns its base path, endpoint configuration, transport
//!   handle and default trace propagator; it is built with `ClientBuilder`.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   the async call that executes it, so request shape is testable offline.
//! - A `RequestContext` bounds each call (deadline, cancellation) and carries
//!   the OpenTelemetry context whose headers are injected into the request.
//! - Nothing is retried and nothing is logged at error level; callers decide.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod propagation;
pub mod transport;
pub mod types;

pub use client::{ZayaClient, TRANSPORT_TIMEOUT};
pub use config::{make_url, ClientBuilder, ClientConfig};
pub use context::{CancellationToken, RequestContext, SharedPropagator};
pub use error::{
    check_for_error, classify, ApiError, ApiErrorKind, HttpErrorResponse, TransportError,
    TransportErrorCategory,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
pub use types::{GenerateLinkRequest, Link, ResponseModel};
