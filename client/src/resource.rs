//! Default monitored-resource detection.
//!
//! When a write carries no resource, the client describes where it is
//! running. Detection checks, in order:
//!
//! 1. Cloud Functions (`FUNCTION_NAME`)
//! 2. App Engine (`GAE_SERVICE` or `GAE_MODULE_NAME`)
//! 3. Kubernetes (`KUBERNETES_SERVICE_HOST`), cluster name from the metadata server
//! 4. Compute Engine, if the metadata server answers
//!
//! and falls back to the `global` resource.

use crate::error::{LoggingError, Result};
use crate::models::MonitoredResource;
use std::sync::Arc;
use std::time::Duration;

/// Base URL of the instance metadata server.
pub const METADATA_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

const METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// Resolves the resource entries are attributed to by default.
#[tonic::async_trait]
pub trait ResourceDetector: Send + Sync {
    /// Describes the current environment.
    async fn detect(&self) -> Result<MonitoredResource>;
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Detects the resource from environment variables and the metadata server.
#[derive(Clone)]
pub struct EnvironmentDetector {
    env: EnvLookup,
    http: reqwest::Client,
    metadata_url: String,
}

impl std::fmt::Debug for EnvironmentDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentDetector")
            .field("metadata_url", &self.metadata_url)
            .finish_non_exhaustive()
    }
}

impl EnvironmentDetector {
    /// Creates a detector over the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata-server HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .map_err(|e| {
                LoggingError::ResourceDetection(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            env: Arc::new(|key| std::env::var(key).ok()),
            http,
            metadata_url: METADATA_URL.to_string(),
        })
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Points metadata reads at another server.
    #[must_use]
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.is_empty())
    }

    /// Reads one value from the metadata server.
    async fn metadata(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.metadata_url, path);
        let response = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| LoggingError::ResourceDetection(e.to_string()))?
            .error_for_status()
            .map_err(|e| LoggingError::ResourceDetection(e.to_string()))?;

        response
            .text()
            .await
            .map(|body| body.trim().to_string())
            .map_err(|e| LoggingError::ResourceDetection(e.to_string()))
    }

    fn cloud_function(&self) -> Option<MonitoredResource> {
        let name = self.var("FUNCTION_NAME")?;
        let mut resource = MonitoredResource::new("cloud_function").with_label("function_name", name);
        if let Some(region) = self.var("FUNCTION_REGION") {
            resource = resource.with_label("region", region);
        }
        Some(resource)
    }

    fn app_engine(&self) -> Option<MonitoredResource> {
        let module = self
            .var("GAE_SERVICE")
            .or_else(|| self.var("GAE_MODULE_NAME"))?;
        let mut resource = MonitoredResource::new("gae_app").with_label("module_id", module);
        if let Some(version) = self
            .var("GAE_VERSION")
            .or_else(|| self.var("GAE_MODULE_VERSION"))
        {
            resource = resource.with_label("version_id", version);
        }
        Some(resource)
    }

    async fn kubernetes(&self) -> Result<MonitoredResource> {
        let cluster = self.metadata("instance/attributes/cluster-name").await?;
        Ok(MonitoredResource::new("container").with_label("cluster_name", cluster))
    }

    async fn compute_engine(&self) -> Option<MonitoredResource> {
        let id = self.metadata("instance/id").await.ok()?;
        let zone = self.metadata("instance/zone").await.ok()?;
        // projects/123/zones/us-central1-a
        let zone = zone.rsplit('/').next().unwrap_or_default().to_string();
        Some(
            MonitoredResource::new("gce_instance")
                .with_label("instance_id", id)
                .with_label("zone", zone),
        )
    }
}

#[tonic::async_trait]
impl ResourceDetector for EnvironmentDetector {
    async fn detect(&self) -> Result<MonitoredResource> {
        let resource = if let Some(resource) = self.cloud_function() {
            resource
        } else if let Some(resource) = self.app_engine() {
            resource
        } else if self.var("KUBERNETES_SERVICE_HOST").is_some() {
            self.kubernetes().await?
        } else if let Some(resource) = self.compute_engine().await {
            resource
        } else {
            MonitoredResource::global()
        };

        tracing::debug!(resource_type = %resource.resource_type, "Detected monitored resource");
        Ok(resource)
    }
}

/// Always reports the same resource.
#[derive(Debug, Clone)]
pub struct FixedResource(pub MonitoredResource);

#[tonic::async_trait]
impl ResourceDetector for FixedResource {
    async fn detect(&self) -> Result<MonitoredResource> {
        Ok(self.0.clone())
    }
}
