//! Data models for the Cloud Logging client.
//!
//! Entries, severities, monitored resources and sink metadata, each with a
//! conversion to and from its wire type.

pub mod entry;
pub mod http_request;
pub mod resource;
pub mod severity;
pub mod sink;

pub use entry::{Entry, EntryMetadata, Operation, Payload, ProtoPayload, SourceLocation};
pub use http_request::HttpRequest;
pub use resource::MonitoredResource;
pub use severity::{ParseSeverityError, Severity};
pub use sink::{Destination, OutputVersionFormat, SinkMetadata, SinkUpdate};
