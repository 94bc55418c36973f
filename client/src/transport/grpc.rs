//! gRPC transport to the Cloud Logging service.

use super::LoggingTransport;
use crate::auth::TokenProvider;
use crate::error::Result;
use crate::proto::v2::{
    self, config_service_v2_client::ConfigServiceV2Client,
    logging_service_v2_client::LoggingServiceV2Client,
};
use std::sync::Arc;
use std::time::Duration;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Response, Status};

/// Default service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://logging.googleapis.com";

/// Transport over a tonic channel.
///
/// Every call carries an `authorization` header from the configured
/// [`TokenProvider`]; without one, calls go out unauthenticated (useful
/// against emulators).
#[derive(Clone)]
pub struct GrpcTransport {
    logging: LoggingServiceV2Client<Channel>,
    config: ConfigServiceV2Client<Channel>,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl GrpcTransport {
    /// Connects to `endpoint`, using TLS for `https` URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is malformed or unreachable.
    pub async fn connect(
        endpoint: &str,
        timeout: Duration,
        tokens: Option<Arc<dyn TokenProvider>>,
    ) -> Result<Self> {
        let mut ep = Endpoint::from_shared(endpoint.to_string())?
            .timeout(timeout)
            .connect_timeout(timeout);

        if endpoint.starts_with("https://") {
            let mut tls = ClientTlsConfig::new().with_native_roots();
            if let Some(host) = ep.uri().host() {
                tls = tls.domain_name(host.to_string());
            }
            ep = ep.tls_config(tls)?;
        }

        tracing::debug!(endpoint, "Connecting to logging service");
        let channel = ep.connect().await?;
        Ok(Self::from_channel(channel, tokens))
    }

    /// Wraps an already established channel.
    #[must_use]
    pub fn from_channel(channel: Channel, tokens: Option<Arc<dyn TokenProvider>>) -> Self {
        Self {
            logging: LoggingServiceV2Client::new(channel.clone()),
            config: ConfigServiceV2Client::new(channel),
            tokens,
        }
    }

    async fn request<T>(&self, message: T) -> std::result::Result<Request<T>, Status> {
        let mut request = Request::new(message);
        if let Some(tokens) = &self.tokens {
            let header = tokens
                .authorization()
                .await
                .map_err(|e| Status::unauthenticated(e.to_string()))?;
            let value: MetadataValue<Ascii> = header
                .parse()
                .map_err(|_| Status::unauthenticated("Token is not a valid header value"))?;
            request.metadata_mut().insert("authorization", value);
        }
        Ok(request)
    }
}

#[tonic::async_trait]
impl LoggingTransport for GrpcTransport {
    async fn write_log_entries(
        &self,
        request: v2::WriteLogEntriesRequest,
    ) -> std::result::Result<v2::WriteLogEntriesResponse, Status> {
        let request = self.request(request).await?;
        self.logging
            .clone()
            .write_log_entries(request)
            .await
            .map(Response::into_inner)
    }

    async fn list_log_entries(
        &self,
        request: v2::ListLogEntriesRequest,
    ) -> std::result::Result<v2::ListLogEntriesResponse, Status> {
        let request = self.request(request).await?;
        self.logging
            .clone()
            .list_log_entries(request)
            .await
            .map(Response::into_inner)
    }

    async fn delete_log(&self, request: v2::DeleteLogRequest) -> std::result::Result<(), Status> {
        let request = self.request(request).await?;
        self.logging
            .clone()
            .delete_log(request)
            .await
            .map(Response::into_inner)
    }

    async fn list_logs(
        &self,
        request: v2::ListLogsRequest,
    ) -> std::result::Result<v2::ListLogsResponse, Status> {
        let request = self.request(request).await?;
        self.logging
            .clone()
            .list_logs(request)
            .await
            .map(Response::into_inner)
    }

    async fn create_sink(
        &self,
        request: v2::CreateSinkRequest,
    ) -> std::result::Result<v2::LogSink, Status> {
        let request = self.request(request).await?;
        self.config
            .clone()
            .create_sink(request)
            .await
            .map(Response::into_inner)
    }

    async fn get_sink(&self, request: v2::GetSinkRequest) -> std::result::Result<v2::LogSink, Status> {
        let request = self.request(request).await?;
        self.config
            .clone()
            .get_sink(request)
            .await
            .map(Response::into_inner)
    }

    async fn update_sink(
        &self,
        request: v2::UpdateSinkRequest,
    ) -> std::result::Result<v2::LogSink, Status> {
        let request = self.request(request).await?;
        self.config
            .clone()
            .update_sink(request)
            .await
            .map(Response::into_inner)
    }

    async fn delete_sink(&self, request: v2::DeleteSinkRequest) -> std::result::Result<(), Status> {
        let request = self.request(request).await?;
        self.config
            .clone()
            .delete_sink(request)
            .await
            .map(Response::into_inner)
    }

    async fn list_sinks(
        &self,
        request: v2::ListSinksRequest,
    ) -> std::result::Result<v2::ListSinksResponse, Status> {
        let request = self.request(request).await?;
        self.config
            .clone()
            .list_sinks(request)
            .await
            .map(Response::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoggingError;

    struct StaticToken;

    #[tonic::async_trait]
    impl TokenProvider for StaticToken {
        async fn authorization(&self) -> Result<String> {
            Ok("Bearer test-token".to_string())
        }

        fn project_id(&self) -> Option<String> {
            None
        }
    }

    struct BrokenToken;

    #[tonic::async_trait]
    impl TokenProvider for BrokenToken {
        async fn authorization(&self) -> Result<String> {
            Err(LoggingError::Auth("no credentials".to_string()))
        }

        fn project_id(&self) -> Option<String> {
            None
        }
    }

    fn lazy_channel() -> Channel {
        Endpoint::from_static("http://127.0.0.1:1").connect_lazy()
    }

    #[tokio::test]
    async fn test_request_carries_authorization() {
        let transport = GrpcTransport::from_channel(lazy_channel(), Some(Arc::new(StaticToken)));
        let request = transport.request(v2::DeleteLogRequest::default()).await.unwrap();
        assert_eq!(
            request.metadata().get("authorization").unwrap(),
            "Bearer test-token"
        );
    }

    #[tokio::test]
    async fn test_request_without_tokens_is_unauthenticated() {
        let transport = GrpcTransport::from_channel(lazy_channel(), None);
        let request = transport.request(v2::DeleteLogRequest::default()).await.unwrap();
        assert!(request.metadata().get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_token_failure_maps_to_unauthenticated() {
        let transport = GrpcTransport::from_channel(lazy_channel(), Some(Arc::new(BrokenToken)));
        let status = transport
            .delete_log(v2::DeleteLogRequest::default())
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }
}
