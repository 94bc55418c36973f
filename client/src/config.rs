//! Client configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use crate::error::{LoggingError, Result};
use crate::transport::grpc::DEFAULT_ENDPOINT;
use std::time::Duration;

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client configuration.
///
/// Configuration values can be set via environment variables:
/// - `GOOGLE_CLOUD_PROJECT` or `GCLOUD_PROJECT`: project id (default: the credentials' project)
/// - `CLOUD_LOGGING_ENDPOINT`: service endpoint (default: `https://logging.googleapis.com`)
/// - `CLOUD_LOGGING_TIMEOUT_SECS`: per-call timeout (default: 60)
/// - `CLOUD_LOGGING_DETECT_RESOURCE`: detect the default monitored resource (default: true)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Project to operate on.
    pub project_id: Option<String>,
    /// Service endpoint URL.
    pub endpoint: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Whether writes without a resource should describe the environment.
    pub detect_resource: bool,
}

impl ClientConfig {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `CLOUD_LOGGING_TIMEOUT_SECS` is set but is not a whole number of seconds
    /// - `CLOUD_LOGGING_DETECT_RESOURCE` is set but is not a boolean
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let project_id = var("GOOGLE_CLOUD_PROJECT")
            .or_else(|| var("GCLOUD_PROJECT"))
            .filter(|p| !p.is_empty());

        let endpoint = var("CLOUD_LOGGING_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let timeout = var("CLOUD_LOGGING_TIMEOUT_SECS")
            .map(|t| {
                t.parse::<u64>().map_err(|e| {
                    LoggingError::Config(format!("CLOUD_LOGGING_TIMEOUT_SECS: {e}"))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let detect_resource = var("CLOUD_LOGGING_DETECT_RESOURCE")
            .map(|d| parse_bool(&d))
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            project_id,
            endpoint,
            timeout: Duration::from_secs(timeout),
            detect_resource,
        })
    }

    /// Sets the project id.
    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(LoggingError::Config(format!(
            "CLOUD_LOGGING_DETECT_RESOURCE: expected a boolean, got {other}"
        ))),
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            detect_resource: true,
        }
    }
}
