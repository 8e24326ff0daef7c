//! Client for the Zaya link-shortening API.
//!
//! # Design
//! Every operation is a single round-trip: build an `HttpRequest`, execute it
//! on the transport, run the outcome through `check_for_error`, then decode
//! the body. The `build_*` methods are public so the exact request an
//! operation sends can be inspected without any I/O.
//!
//! The client holds no per-call state and is safe to share between tasks.
//! Replacing the transport needs `&mut self`, so it cannot race in-flight
//! calls.

use std::time::Duration;

use tracing::instrument;

use crate::config::{ClientBuilder, ClientConfig};
use crate::context::{RequestContext, SharedPropagator};
use crate::error::{check_for_error, ApiError, TransportError};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, APPLICATION_FORM, APPLICATION_JSON, CACHE_CONTROL,
    CONTENT_TYPE,
};
use crate::propagation::inject_tracing_headers;
use crate::transport::Transport;
use crate::types::{GenerateLinkRequest, ResponseModel};

/// Timeout forced onto any caller-supplied transport.
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ZayaClient {
    base_path: String,
    config: ClientConfig,
    transport: Transport,
    default_propagator: SharedPropagator,
}

impl ZayaClient {
    /// Client with default endpoints, transport and propagator.
    pub fn new(base_path: &str) -> Self {
        Self::builder(base_path).build()
    }

    pub fn builder(base_path: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_path)
    }

    pub(crate) fn from_parts(
        base_path: String,
        config: ClientConfig,
        transport: Transport,
        default_propagator: SharedPropagator,
    ) -> Self {
        Self {
            base_path,
            config,
            transport,
            default_propagator,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Replace the transport handle. Its timeout is always reset to 30 seconds.
    pub fn set_transport(&mut self, mut transport: Transport) {
        transport.set_timeout(TRANSPORT_TIMEOUT);
        self.transport = transport;
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_path)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    /// Base request with trace headers injected from `ctx`, when it has a span.
    pub fn request(
        &self,
        ctx: &RequestContext,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(method, url);
        inject_tracing_headers(ctx, self.default_propagator.as_ref(), &mut request);
        request
    }

    /// JSON request with bearer auth that bypasses intermediary caches.
    pub fn request_with_bearer_auth_no_cache(
        &self,
        ctx: &RequestContext,
        token: &str,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> HttpRequest {
        let mut request = self.request_with_bearer_auth(ctx, token, method, url);
        request.set_header(CACHE_CONTROL, "no-cache");
        request
    }

    /// JSON request with bearer auth.
    pub fn request_with_bearer_auth(
        &self,
        ctx: &RequestContext,
        token: &str,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> HttpRequest {
        let mut request = self.request(ctx, method, url);
        request.set_auth_token(token);
        request.set_header(CONTENT_TYPE, APPLICATION_JSON);
        request
    }

    /// Form-encoded request with bearer auth.
    pub fn request_form_data(
        &self,
        ctx: &RequestContext,
        token: &str,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> HttpRequest {
        let mut request = self.request(ctx, method, url);
        request.set_auth_token(token);
        request.set_header(CONTENT_TYPE, APPLICATION_FORM);
        request
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn build_create_link(
        &self,
        ctx: &RequestContext,
        token: &str,
        link: &GenerateLinkRequest,
    ) -> HttpRequest {
        let url = self.endpoint_url(&self.config.create_link_endpoint);
        let mut request = self.request_form_data(ctx, token, HttpMethod::Post, url);
        request.set_form_data(link.form_fields());
        request
    }

    pub fn build_get_link(&self, ctx: &RequestContext, token: &str, id: &str) -> HttpRequest {
        let url = format!("{}/{id}", self.endpoint_url(&self.config.get_link_endpoint));
        self.request_with_bearer_auth_no_cache(ctx, token, HttpMethod::Get, url)
    }

    #[instrument(skip_all, fields(operation = "create_link"))]
    pub async fn create_link(
        &self,
        ctx: &RequestContext,
        token: &str,
        link: &GenerateLinkRequest,
    ) -> Result<ResponseModel, ApiError> {
        let request = self.build_create_link(ctx, token, link);
        self.send(ctx, request, "failed to create link").await
    }

    #[instrument(skip_all, fields(operation = "get_link", link_id = %id))]
    pub async fn get_link(
        &self,
        ctx: &RequestContext,
        token: &str,
        id: &str,
    ) -> Result<ResponseModel, ApiError> {
        let request = self.build_get_link(ctx, token, id);
        self.send(ctx, request, "failed to get link").await
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        request: HttpRequest,
        context: &str,
    ) -> Result<ResponseModel, ApiError> {
        let (response, error) = match self.transport.execute(ctx, request).await {
            Ok(response) => (Some(response), None),
            Err(error) => (None, Some(error)),
        };
        let response = check_for_error(response.as_ref(), error.as_ref(), context)?;
        decode_response(response).map_err(|err| ApiError::from_transport(context, &err))
    }
}

/// Decode a success body. An empty body is the default model.
fn decode_response(response: &HttpResponse) -> Result<ResponseModel, TransportError> {
    if response.body.trim().is_empty() {
        return Ok(ResponseModel::default());
    }
    Ok(serde_json::from_str(&response.body)?)
}
