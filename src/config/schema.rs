//! Configuration schema definitions.
//!
//! Both values are read once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Where every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Where inbound requests are accepted.
    pub listener: ListenerConfig,
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL including scheme and host (e.g., "https://backend.example.com").
    ///
    /// The inbound request-target is appended to this string verbatim.
    pub base_url: String,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Listen address (e.g., "127.0.0.1:8080" or ":8080").
    pub listen: String,
}

impl ForwarderConfig {
    /// Build a config directly from the two startup values.
    pub fn new(base_url: impl Into<String>, listen: impl Into<String>) -> Self {
        Self {
            upstream: UpstreamConfig {
                base_url: base_url.into(),
            },
            listener: ListenerConfig {
                listen: listen.into(),
            },
        }
    }

    /// Apply command-line overrides on top of file values.
    pub fn merge_overrides(mut self, base_url: Option<String>, listen: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.upstream.base_url = base_url;
        }
        if let Some(listen) = listen {
            self.listener.listen = listen;
        }
        self
    }
}
