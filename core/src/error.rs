//! Error model for the Zaya API client.
//!
//! # Design
//! Every failed call produces exactly one `ApiError`. It carries the HTTP
//! status (0 when the request never produced one), a human-readable message,
//! and an `ApiErrorKind` label. The kind is derived only from the transport
//! error, never from the response body, and never changes control flow.
//!
//! `check_for_error` is the single place where a transport outcome is turned
//! into either a usable response or an `ApiError`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpResponse;

/// Classification label attached to every `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Connection-level failure: unreachable host, refused or reset connection.
    Network,
    /// Deadline exceeded or the call was cancelled.
    Timeout,
    /// The response body could not be decoded into the expected shape.
    Parsing,
    /// Anything else, including plain HTTP status failures.
    Unknown,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::Network => "network",
            ApiErrorKind::Timeout => "timeout",
            ApiErrorKind::Parsing => "parsing",
            ApiErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Coarse category of a transport failure, independent of the HTTP library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCategory {
    Connection,
    Deadline,
    Decode,
    Other,
}

/// Map a transport error category onto the public error taxonomy.
pub fn classify(category: TransportErrorCategory) -> ApiErrorKind {
    match category {
        TransportErrorCategory::Connection => ApiErrorKind::Network,
        TransportErrorCategory::Deadline => ApiErrorKind::Timeout,
        TransportErrorCategory::Decode => ApiErrorKind::Parsing,
        TransportErrorCategory::Other => ApiErrorKind::Unknown,
    }
}

/// Failure raised below the HTTP status layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn category(&self) -> TransportErrorCategory {
        match self {
            TransportError::Request(err) => {
                if err.is_timeout() {
                    TransportErrorCategory::Deadline
                } else if err.is_connect() {
                    TransportErrorCategory::Connection
                } else if err.is_decode() || err.is_body() {
                    TransportErrorCategory::Decode
                } else {
                    TransportErrorCategory::Other
                }
            }
            TransportError::Cancelled | TransportError::DeadlineExceeded => {
                TransportErrorCategory::Deadline
            }
            TransportError::Decode(_) => TransportErrorCategory::Decode,
        }
    }
}

/// Classify an optional transport error. A missing error is `Unknown`.
pub fn parse_error_kind(error: Option<&TransportError>) -> ApiErrorKind {
    error.map_or(ApiErrorKind::Unknown, |err| classify(err.category()))
}

/// Uniform error returned by every client operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    code: u16,
    message: String,
    kind: ApiErrorKind,
}

impl ApiError {
    pub fn new(code: u16, message: impl Into<String>, kind: ApiErrorKind) -> Self {
        Self {
            code,
            message: message.into(),
            kind,
        }
    }

    /// Wrap a transport failure with the operation's context message.
    pub fn from_transport(context: &str, error: &TransportError) -> Self {
        Self::new(0, format!("{context}: {error}"), parse_error_kind(Some(error)))
    }

    /// HTTP status code, or 0 when no response was received.
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }
}

/// Structured error body the server may return alongside a failure status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HttpErrorResponse {
    fn parts(&self) -> impl Iterator<Item = &str> {
        [&self.error, &self.message, &self.description]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.parts().next().is_none()
    }
}

impl fmt::Display for HttpErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.parts().collect();
        f.write_str(&parts.join(", "))
    }
}

/// Turn a transport outcome into either the response or an `ApiError`.
///
/// Checks run in order and the first match wins:
/// 1. a transport error yields code 0 and `"<context>: <error>"`;
/// 2. a missing response yields code 0 and `"empty response"`;
/// 3. a non-2xx status yields `"<status line>: <detail>"`, where the detail is
///    the structured error body, else the raw body, else nothing;
/// 4. anything else is a success.
pub fn check_for_error<'a>(
    response: Option<&'a HttpResponse>,
    error: Option<&TransportError>,
    context: &str,
) -> Result<&'a HttpResponse, ApiError> {
    if let Some(err) = error {
        return Err(ApiError::from_transport(context, err));
    }

    let Some(response) = response else {
        return Err(ApiError::new(0, "empty response", parse_error_kind(error)));
    };

    if response.is_error() {
        let status = response.status_line();
        let message = match response.structured_error() {
            Some(body) => format!("{status}: {body}"),
            None if !response.body.is_empty() => format!("{status}: {}", response.body),
            None => status,
        };
        return Err(ApiError::new(response.status, message, parse_error_kind(error)));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn classify_covers_every_category() {
        assert_eq!(classify(TransportErrorCategory::Connection), ApiErrorKind::Network);
        assert_eq!(classify(TransportErrorCategory::Deadline), ApiErrorKind::Timeout);
        assert_eq!(classify(TransportErrorCategory::Decode), ApiErrorKind::Parsing);
        assert_eq!(classify(TransportErrorCategory::Other), ApiErrorKind::Unknown);
    }

    #[test]
    fn cancellation_and_deadline_are_timeouts() {
        assert_eq!(parse_error_kind(Some(&TransportError::Cancelled)), ApiErrorKind::Timeout);
        assert_eq!(
            parse_error_kind(Some(&TransportError::DeadlineExceeded)),
            ApiErrorKind::Timeout
        );
    }

    #[test]
    fn decode_failure_is_parsing() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert_eq!(parse_error_kind(Some(&TransportError::Decode(err))), ApiErrorKind::Parsing);
    }

    #[test]
    fn missing_error_is_unknown() {
        assert_eq!(parse_error_kind(None), ApiErrorKind::Unknown);
    }

    #[test]
    fn success_passes_response_through() {
        let resp = response(200, r#"{"data":null}"#);
        let checked = check_for_error(Some(&resp), None, "failed").unwrap();
        assert_eq!(checked.status, 200);
    }

    #[test]
    fn transport_error_wraps_context() {
        let err = check_for_error(None, Some(&TransportError::Cancelled), "failed to get link")
            .unwrap_err();
        assert_eq!(err.code(), 0);
        assert_eq!(err.message(), "failed to get link: context cancelled");
        assert_eq!(err.kind(), ApiErrorKind::Timeout);
    }

    #[test]
    fn transport_error_wins_over_response() {
        let resp = response(500, "boom");
        let err = check_for_error(Some(&resp), Some(&TransportError::Cancelled), "ctx").unwrap_err();
        assert_eq!(err.code(), 0);
        assert!(err.message().starts_with("ctx: "));
    }

    #[test]
    fn missing_response_is_empty_response() {
        let err = check_for_error(None, None, "failed to create link").unwrap_err();
        assert_eq!(err.code(), 0);
        assert_eq!(err.message(), "empty response");
        assert_eq!(err.kind(), ApiErrorKind::Unknown);
    }

    #[test]
    fn structured_body_is_preferred() {
        let resp = response(404, r#"{"error":"not_found","message":"link not found"}"#);
        let err = check_for_error(Some(&resp), None, "ctx").unwrap_err();
        assert_eq!(err.code(), 404);
        assert_eq!(err.message(), "404 Not Found: not_found, link not found");
        assert_eq!(err.kind(), ApiErrorKind::Unknown);
    }

    #[test]
    fn empty_structured_body_falls_back_to_raw_body() {
        let resp = response(422, r#"{"error":""}"#);
        let err = check_for_error(Some(&resp), None, "ctx").unwrap_err();
        assert_eq!(err.message(), r#"422 Unprocessable Entity: {"error":""}"#);
    }

    #[test]
    fn raw_body_used_when_not_json() {
        let resp = response(500, "database unavailable");
        let err = check_for_error(Some(&resp), None, "ctx").unwrap_err();
        assert_eq!(err.code(), 500);
        assert_eq!(err.message(), "500 Internal Server Error: database unavailable");
    }

    #[test]
    fn no_body_yields_status_line_only() {
        let resp = response(503, "");
        let err = check_for_error(Some(&resp), None, "ctx").unwrap_err();
        assert_eq!(err.message(), "503 Service Unavailable");
    }

    #[test]
    fn unregistered_status_has_bare_code() {
        let resp = response(599, "");
        let err = check_for_error(Some(&resp), None, "ctx").unwrap_err();
        assert_eq!(err.code(), 599);
        assert_eq!(err.message(), "599");
    }

    #[test]
    fn error_display_is_message() {
        let err = ApiError::new(401, "401 Unauthorized", ApiErrorKind::Unknown);
        assert_eq!(err.to_string(), "401 Unauthorized");
    }

    #[test]
    fn http_error_response_display_skips_blank_parts() {
        let body = HttpErrorResponse {
            error: Some("invalid_request".to_string()),
            message: Some(String::new()),
            description: Some("alias already taken".to_string()),
        };
        assert!(!body.is_empty());
        assert_eq!(body.to_string(), "invalid_request, alias already taken");
        assert!(HttpErrorResponse::default().is_empty());
    }
}
