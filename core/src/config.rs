//! Endpoint configuration and the client builder.

use std::sync::Arc;

use opentelemetry_sdk::propagation::TraceContextPropagator;
use serde::{Deserialize, Serialize};

use crate::client::{ZayaClient, TRANSPORT_TIMEOUT};
use crate::context::SharedPropagator;
use crate::transport::Transport;

pub(crate) const URL_SEPARATOR: char = '/';

/// Join path segments with a single separator.
pub fn make_url(segments: &[&str]) -> String {
    segments.join("/")
}

fn default_links_endpoint() -> String {
    make_url(&["api", "v1", "links"])
}

fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_matches(URL_SEPARATOR).to_string()
}

/// Relative endpoint paths, joined onto the client's base path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub create_link_endpoint: String,
    pub get_link_endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            create_link_endpoint: default_links_endpoint(),
            get_link_endpoint: default_links_endpoint(),
        }
    }
}

impl ClientConfig {
    /// Strip redundant leading and trailing separators from every endpoint.
    pub fn normalized(self) -> Self {
        Self {
            create_link_endpoint: normalize_endpoint(&self.create_link_endpoint),
            get_link_endpoint: normalize_endpoint(&self.get_link_endpoint),
        }
    }
}

/// Builder for `ZayaClient`. Every setter is independent of the others.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_path: String,
    config: ClientConfig,
    transport: Option<Transport>,
    default_propagator: Option<SharedPropagator>,
}

impl ClientBuilder {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            config: ClientConfig::default(),
            transport: None,
            default_propagator: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn create_link_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.create_link_endpoint = endpoint.into();
        self
    }

    pub fn get_link_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.get_link_endpoint = endpoint.into();
        self
    }

    /// Install a caller-supplied transport. Its timeout is reset to 30 seconds.
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Propagator used when a call's context does not supply its own.
    pub fn default_propagator(mut self, propagator: SharedPropagator) -> Self {
        self.default_propagator = Some(propagator);
        self
    }

    pub fn build(self) -> ZayaClient {
        ZayaClient::from_parts(
            self.base_path.trim_end_matches(URL_SEPARATOR).to_string(),
            self.config.normalized(),
            self.transport
                .map(|transport| transport.with_timeout(TRANSPORT_TIMEOUT))
                .unwrap_or_default(),
            self.default_propagator
                .unwrap_or_else(|| Arc::new(TraceContextPropagator::new())),
        )
    }
}
