//! RPC transports.
//!
//! The [`LoggingTransport`] trait is the seam between the client and the
//! service: one method per RPC, requests and responses in wire form, errors
//! as the raw `tonic::Status`. Two implementations are provided:
//!
//! - [`GrpcTransport`] talks to the real service over TLS.
//! - [`InMemoryTransport`] emulates the service in process, for development
//!   and testing.

pub mod grpc;
pub mod memory;

pub use grpc::GrpcTransport;
pub use memory::InMemoryTransport;

use crate::proto::v2;
use tonic::Status;

/// The RPC surface of the Logging v2 API used by this crate.
///
/// Implementations must be thread-safe (Send + Sync).
#[tonic::async_trait]
pub trait LoggingTransport: Send + Sync {
    /// `LoggingServiceV2.WriteLogEntries`
    async fn write_log_entries(
        &self,
        request: v2::WriteLogEntriesRequest,
    ) -> Result<v2::WriteLogEntriesResponse, Status>;

    /// `LoggingServiceV2.ListLogEntries`
    async fn list_log_entries(
        &self,
        request: v2::ListLogEntriesRequest,
    ) -> Result<v2::ListLogEntriesResponse, Status>;

    /// `LoggingServiceV2.DeleteLog`
    async fn delete_log(&self, request: v2::DeleteLogRequest) -> Result<(), Status>;

    /// `LoggingServiceV2.ListLogs`
    async fn list_logs(&self, request: v2::ListLogsRequest)
        -> Result<v2::ListLogsResponse, Status>;

    /// `ConfigServiceV2.CreateSink`
    async fn create_sink(&self, request: v2::CreateSinkRequest) -> Result<v2::LogSink, Status>;

    /// `ConfigServiceV2.GetSink`
    async fn get_sink(&self, request: v2::GetSinkRequest) -> Result<v2::LogSink, Status>;

    /// `ConfigServiceV2.UpdateSink`
    async fn update_sink(&self, request: v2::UpdateSinkRequest) -> Result<v2::LogSink, Status>;

    /// `ConfigServiceV2.DeleteSink`
    async fn delete_sink(&self, request: v2::DeleteSinkRequest) -> Result<(), Status>;

    /// `ConfigServiceV2.ListSinks`
    async fn list_sinks(
        &self,
        request: v2::ListSinksRequest,
    ) -> Result<v2::ListSinksResponse, Status>;
}
