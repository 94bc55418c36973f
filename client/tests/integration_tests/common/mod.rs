//! Common test utilities and helpers for integration tests.

use chrono::{DateTime, TimeZone, Utc};
use cloud_logging::transport::InMemoryTransport;
use cloud_logging::{Entry, EntryMetadata, Logging, Severity};
use std::sync::Arc;

/// Project every test client operates on.
pub const PROJECT: &str = "test-project";

/// Creates a client over a fresh in-memory transport.
///
/// # Returns
///
/// A tuple containing the client and the transport, for inspecting what was sent.
pub fn test_client() -> (Logging, Arc<InMemoryTransport>) {
    let transport = InMemoryTransport::new_shared();
    let logging = Logging::with_transport(PROJECT, transport.clone()).unwrap();
    (logging, transport)
}

/// A fixed point in time, `seconds` after 2024-01-01T00:00:00Z.
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200 + seconds, 0).unwrap()
}

/// A text entry with the given severity and timestamp.
pub fn text_entry(text: &str, severity: Severity, seconds: i64) -> Entry {
    Entry::with_metadata(
        EntryMetadata::new()
            .with_severity(severity)
            .with_timestamp(at(seconds)),
        text,
    )
}
