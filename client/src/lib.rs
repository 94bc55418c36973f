//! Cloud Logging Client Library
//!
//! A client for the Google Cloud Logging v2 API: write and read log entries,
//! delete logs, and manage sinks that export entries to Cloud Storage,
//! BigQuery or Pub/Sub.
//!
//! # Modules
//!
//! - [`client`] - The [`Logging`] client, entry reads and sink listing
//! - [`log`] - The [`Log`] handle and severity-tagged writes
//! - [`sink`] - The [`Sink`] handle
//! - [`models`] - Entries, severities, resources and sink metadata
//! - [`transport`] - The RPC seam, over gRPC or in memory
//! - [`resource`] - Default monitored-resource detection
//!
//! # Example
//!
//! ```
//! use cloud_logging::{EntryMetadata, Logging, Severity, WriteOptions};
//! use cloud_logging::transport::InMemoryTransport;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let logging = Logging::with_transport("my-project", InMemoryTransport::new_shared()).unwrap();
//! let log = logging.log("syslog").unwrap();
//!
//! let entry = log.entry(
//!     EntryMetadata::new().with_severity(Severity::Error),
//!     json!({"message": "disk full", "device": "/dev/sda1"}),
//! );
//! log.write(entry, WriteOptions::default()).await.unwrap();
//!
//! let entries = log.get_entries(Default::default()).await.unwrap();
//! assert_eq!(entries.items[0].metadata.severity, Some(Severity::Error));
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod log;
pub mod models;
pub mod names;
pub mod proto;
pub mod resource;
pub mod sink;
pub mod transport;

pub use client::{GetEntriesOptions, GetSinksOptions, Logging, Page};
pub use config::ClientConfig;
pub use error::{EntryError, LoggingError, Result};
pub use log::{Entries, Log, WriteOptions, WriteOutcome};
pub use models::{
    Destination, Entry, EntryMetadata, HttpRequest, MonitoredResource, OutputVersionFormat,
    Payload, Severity, SinkMetadata, SinkUpdate,
};
pub use sink::Sink;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde_json;
