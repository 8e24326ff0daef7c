//! HTTP request and response values.
//!
//! # Design
//! Requests are described as plain data before they reach the transport, so
//! the URL, headers and encoded body of every operation can be inspected
//! without touching the network. The transport turns an `HttpRequest` into a
//! real round-trip and hands back an `HttpResponse` with the body already
//! read into memory.
//!
//! All fields use owned types so values can move freely between the client,
//! the transport and the caller.

use reqwest::StatusCode;

use crate::error::HttpErrorResponse;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const CACHE_CONTROL: &str = "Cache-Control";

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An outgoing request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing value under the same
    /// (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_auth_token(&mut self, token: &str) {
        self.set_header(AUTHORIZATION, format!("Bearer {token}"));
    }

    /// Encode `fields` as an `application/x-www-form-urlencoded` body,
    /// preserving their order.
    pub fn set_form_data<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        self.body = Some(serializer.finish());
    }

    /// Decode the form body back into ordered pairs. Empty when there is no body.
    pub fn form_data(&self) -> Vec<(String, String)> {
        self.body
            .as_deref()
            .map(|body| {
                url::form_urlencoded::parse(body.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A received response with its body read to a string.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// True for any status outside 2xx.
    pub fn is_error(&self) -> bool {
        !(200..300).contains(&self.status)
    }

    /// Status code followed by its canonical reason, e.g. `"404 Not Found"`.
    pub fn status_line(&self) -> String {
        match StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
        {
            Some(reason) => format!("{} {reason}", self.status),
            None => self.status.to_string(),
        }
    }

    /// The structured error body, if the body decodes into one with content.
    pub fn structured_error(&self) -> Option<HttpErrorResponse> {
        serde_json::from_str::<HttpErrorResponse>(&self.body)
            .ok()
            .filter(|err| !err.is_empty())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
