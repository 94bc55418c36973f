//! HTTP request details attached to a log entry.

use crate::proto::logging_type;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Common information about the HTTP request being logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Request method, e.g. `GET`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_method: String,
    /// Scheme, host, path and query of the requested URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_url: String,
    /// Size of the request in bytes, headers and body included.
    #[serde(default)]
    pub request_size: i64,
    /// Response status code.
    #[serde(default)]
    pub status: i32,
    /// Size of the response in bytes, headers and body included.
    #[serde(default)]
    pub response_size: i64,
    /// User agent sent by the client.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    /// IP address of the client that issued the request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_ip: String,
    /// IP address of the server the request was sent to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_ip: String,
    /// Referer URL of the request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub referer: String,
    /// Time between the server receiving the request and sending the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<Duration>,
    /// Whether a cache lookup was attempted.
    #[serde(default)]
    pub cache_lookup: bool,
    /// Whether an entity was served from cache.
    #[serde(default)]
    pub cache_hit: bool,
    /// Whether the response was validated with the origin server.
    #[serde(default)]
    pub cache_validated_with_origin_server: bool,
    /// Bytes inserted into cache.
    #[serde(default)]
    pub cache_fill_bytes: i64,
    /// Protocol, e.g. `HTTP/1.1`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
}

impl HttpRequest {
    /// Creates a request record with method, URL and status.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>, status: i32) -> Self {
        Self {
            request_method: method.into(),
            request_url: url.into(),
            status,
            ..Self::default()
        }
    }

    /// Sets the request latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn to_proto(&self) -> logging_type::HttpRequest {
        logging_type::HttpRequest {
            request_method: self.request_method.clone(),
            request_url: self.request_url.clone(),
            request_size: self.request_size,
            status: self.status,
            response_size: self.response_size,
            user_agent: self.user_agent.clone(),
            remote_ip: self.remote_ip.clone(),
            referer: self.referer.clone(),
            cache_hit: self.cache_hit,
            cache_validated_with_origin_server: self.cache_validated_with_origin_server,
            cache_lookup: self.cache_lookup,
            cache_fill_bytes: self.cache_fill_bytes,
            server_ip: self.server_ip.clone(),
            latency: self.latency.map(|d| prost_types::Duration {
                seconds: i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
                nanos: d.subsec_nanos() as i32,
            }),
            protocol: self.protocol.clone(),
        }
    }
}

impl From<logging_type::HttpRequest> for HttpRequest {
    fn from(req: logging_type::HttpRequest) -> Self {
        let latency = req.latency.and_then(|d| {
            let secs = u64::try_from(d.seconds).ok()?;
            let nanos = u32::try_from(d.nanos).ok()?;
            Some(Duration::new(secs, nanos))
        });
        Self {
            request_method: req.request_method,
            request_url: req.request_url,
            request_size: req.request_size,
            status: req.status,
            response_size: req.response_size,
            user_agent: req.user_agent,
            remote_ip: req.remote_ip,
            server_ip: req.server_ip,
            referer: req.referer,
            latency,
            cache_lookup: req.cache_lookup,
            cache_hit: req.cache_hit,
            cache_validated_with_origin_server: req.cache_validated_with_origin_server,
            cache_fill_bytes: req.cache_fill_bytes,
            protocol: req.protocol,
        }
    }
}
