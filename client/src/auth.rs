//! Credentials for authenticating RPCs.
//!
//! Tokens come from the application-default credentials chain of
//! `google-cloud-auth`: the `GOOGLE_APPLICATION_CREDENTIALS` key file, the
//! gcloud user credentials, or the metadata server.

use crate::error::{LoggingError, Result};
use google_cloud_auth::project::Config;
use google_cloud_auth::token::DefaultTokenSourceProvider;
use google_cloud_token::{TokenSource, TokenSourceProvider};
use std::sync::Arc;

/// OAuth scopes requested for the Logging API.
pub const SCOPES: [&str; 5] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/cloud-platform.read-only",
    "https://www.googleapis.com/auth/logging.admin",
    "https://www.googleapis.com/auth/logging.read",
    "https://www.googleapis.com/auth/logging.write",
];

/// Supplies the `authorization` header for each call.
#[tonic::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a header value such as `Bearer ya29...`.
    async fn authorization(&self) -> Result<String>;

    /// Project the credentials belong to, when known.
    fn project_id(&self) -> Option<String>;
}

/// Application-default credentials.
#[derive(Clone)]
pub struct Credentials {
    source: Arc<dyn TokenSource>,
    project_id: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Loads credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError::Auth`] if no credentials can be found.
    pub async fn from_environment() -> Result<Self> {
        let config = Config::default().with_scopes(&SCOPES);
        let provider = DefaultTokenSourceProvider::new(config)
            .await
            .map_err(|e| LoggingError::Auth(e.to_string()))?;

        tracing::debug!(
            project_id = ?provider.project_id,
            "Loaded application default credentials"
        );

        Ok(Self {
            source: provider.token_source(),
            project_id: provider.project_id.clone(),
        })
    }
}

#[tonic::async_trait]
impl TokenProvider for Credentials {
    async fn authorization(&self) -> Result<String> {
        let token = self
            .source
            .token()
            .await
            .map_err(|e| LoggingError::Auth(e.to_string()))?;
        Ok(bearer(token))
    }

    fn project_id(&self) -> Option<String> {
        self.project_id.clone()
    }
}

fn bearer(token: String) -> String {
    if token.starts_with("Bearer ") {
        token
    } else {
        format!("Bearer {token}")
    }
}
