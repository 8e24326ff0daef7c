//! reqwest-backed transport handle.
//!
//! # Design
//! `Transport` executes one `HttpRequest` per call and reads the whole body
//! before returning. It never inspects status codes; turning a response into
//! an error is `check_for_error`'s job. The request context bounds the call:
//! cancellation or deadline expiry drops the in-flight future.

use std::time::Duration;

use reqwest::Method;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Shared HTTP execution handle. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a caller-configured `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn execute(
        &self,
        ctx: &RequestContext,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        if ctx.cancellation().is_some_and(|token| token.is_cancelled()) {
            return Err(TransportError::Cancelled);
        }

        let round_trip = self.round_trip(request);
        let cancelled = async {
            match ctx.cancellation() {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match ctx.deadline() {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = round_trip => result,
            () = cancelled => Err(TransportError::Cancelled),
            () = deadline => Err(TransportError::DeadlineExceeded),
        }
    }

    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        debug!(method = request.method.as_str(), url = %request.url, "dispatching request");

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;
        debug!(status, "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancellationToken;
    use crate::error::ApiErrorKind;

    #[test]
    fn default_transport_has_no_timeout() {
        assert!(Transport::new().timeout().is_none());
    }

    #[test]
    fn with_timeout_overrides() {
        let transport = Transport::new().with_timeout(Duration::from_secs(3));
        assert_eq!(transport.timeout(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn already_cancelled_context_never_dispatches() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new().with_cancellation(token);
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/never");

        let err = Transport::new().execute(&ctx, request).await.unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
        assert_eq!(crate::error::parse_error_kind(Some(&err)), ApiErrorKind::Timeout);
    }
}
