//! The [`Log`] handle.

use crate::client::{GetEntriesOptions, Logging, Page};
use crate::error::Result;
use crate::models::{Entry, EntryMetadata, MonitoredResource, Payload, Severity};
use crate::names;
use crate::proto::v2;
use futures::stream::BoxStream;
use std::collections::HashMap;

/// One entry or a batch of entries.
#[derive(Debug, Clone, Default)]
pub struct Entries(pub Vec<Entry>);

impl From<Entry> for Entries {
    fn from(entry: Entry) -> Self {
        Self(vec![entry])
    }
}

impl From<Vec<Entry>> for Entries {
    fn from(entries: Vec<Entry>) -> Self {
        Self(entries)
    }
}

impl From<&str> for Entries {
    fn from(text: &str) -> Self {
        Entry::new(text).into()
    }
}

impl From<String> for Entries {
    fn from(text: String) -> Self {
        Entry::new(text).into()
    }
}

impl From<serde_json::Value> for Entries {
    fn from(value: serde_json::Value) -> Self {
        Entry::new(value).into()
    }
}

/// Request-level settings for a write.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Resource for entries that carry none. Detected when absent.
    pub resource: Option<MonitoredResource>,
    /// Labels added to entries that lack them.
    pub labels: HashMap<String, String>,
    /// Write the valid entries even if some are rejected.
    pub partial_success: bool,
    /// Validate without storing.
    pub dry_run: bool,
}

impl WriteOptions {
    /// Sets the resource.
    #[must_use]
    pub fn with_resource(mut self, resource: MonitoredResource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Adds a request label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Result of a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Entries sent to the service.
    pub written: usize,
    /// Entries left out because they could not be serialized.
    pub dropped: usize,
}

/// A named log within a project.
///
/// # Example
///
/// ```
/// use cloud_logging::{Logging, Severity, WriteOptions, transport::InMemoryTransport};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let logging = Logging::with_transport("my-project", InMemoryTransport::new_shared()).unwrap();
/// let log = logging.log("requests").unwrap();
/// assert_eq!(log.formatted_name(), "projects/my-project/logs/requests");
///
/// let outcome = log
///     .warning(json!({"path": "/slow", "ms": 1200}), WriteOptions::default())
///     .await
///     .unwrap();
/// assert_eq!(outcome.written, 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Log {
    logging: Logging,
    name: String,
    formatted_name: String,
}

impl Log {
    pub(crate) fn new(logging: Logging, name: &str) -> Result<Self> {
        let formatted_name = names::log_name(logging.project_id(), name)?;
        Ok(Self {
            name: names::short_name(&formatted_name),
            formatted_name,
            logging,
        })
    }

    /// Log id, e.g. `syslog`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified name, `projects/{project}/logs/{log}`.
    #[must_use]
    pub fn formatted_name(&self) -> &str {
        &self.formatted_name
    }

    /// Creates an entry for this log.
    #[must_use]
    pub fn entry(&self, metadata: EntryMetadata, data: impl Into<Payload>) -> Entry {
        Entry::with_metadata(metadata, data)
    }

    /// Writes entries.
    ///
    /// Entries that cannot be serialized are dropped and counted in the
    /// outcome; the rest are sent in one request. If nothing is left to send,
    /// no request is made.
    ///
    /// # Errors
    ///
    /// Returns the RPC failure, if any.
    pub async fn write(
        &self,
        entries: impl Into<Entries>,
        options: WriteOptions,
    ) -> Result<WriteOutcome> {
        let Entries(entries) = entries.into();
        let total = entries.len();

        let mut wire = Vec::with_capacity(total);
        for entry in &entries {
            match entry.to_proto() {
                Ok(proto) => wire.push(proto),
                Err(e) => {
                    tracing::warn!(
                        log_name = %self.formatted_name,
                        error = %e,
                        "Dropping log entry that cannot be serialized"
                    );
                }
            }
        }
        let outcome = WriteOutcome {
            written: wire.len(),
            dropped: total - wire.len(),
        };
        if wire.is_empty() && total > 0 {
            return Ok(outcome);
        }

        let resource = match &options.resource {
            Some(resource) => Some(resource.to_proto()),
            None => self.logging.default_resource().await,
        };

        let request = v2::WriteLogEntriesRequest {
            log_name: self.formatted_name.clone(),
            resource,
            labels: options.labels,
            entries: wire,
            partial_success: options.partial_success,
            dry_run: options.dry_run,
        };

        tracing::debug!(
            log_name = %self.formatted_name,
            count = outcome.written,
            dropped = outcome.dropped,
            "Writing log entries"
        );
        self.logging.transport().write_log_entries(request).await?;
        Ok(outcome)
    }

    async fn write_with_severity(
        &self,
        severity: Severity,
        entries: impl Into<Entries>,
        options: WriteOptions,
    ) -> Result<WriteOutcome> {
        let Entries(entries) = entries.into();
        let entries: Vec<Entry> = entries
            .into_iter()
            .map(|entry| entry.with_severity(severity))
            .collect();
        self.write(entries, options).await
    }

    /// Writes entries with severity `ALERT`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn alert(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Alert, entries, options).await
    }

    /// Writes entries with severity `CRITICAL`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn critical(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Critical, entries, options).await
    }

    /// Writes entries with severity `DEBUG`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn debug(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Debug, entries, options).await
    }

    /// Writes entries with severity `EMERGENCY`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn emergency(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Emergency, entries, options).await
    }

    /// Writes entries with severity `ERROR`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn error(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Error, entries, options).await
    }

    /// Writes entries with severity `INFO`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn info(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Info, entries, options).await
    }

    /// Writes entries with severity `NOTICE`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn notice(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Notice, entries, options).await
    }

    /// Writes entries with severity `WARNING`.
    ///
    /// # Errors
    ///
    /// See [`Log::write`].
    pub async fn warning(&self, entries: impl Into<Entries>, options: WriteOptions) -> Result<WriteOutcome> {
        self.write_with_severity(Severity::Warning, entries, options).await
    }

    /// Deletes the log and all of its entries.
    ///
    /// # Errors
    ///
    /// Returns the RPC failure, e.g. `NOT_FOUND` for a log with no entries.
    pub async fn delete(&self) -> Result<()> {
        tracing::debug!(log_name = %self.formatted_name, "Deleting log");
        self.logging
            .transport()
            .delete_log(v2::DeleteLogRequest {
                log_name: self.formatted_name.clone(),
            })
            .await?;
        Ok(())
    }

    fn scoped(&self, mut options: GetEntriesOptions) -> GetEntriesOptions {
        let own = format!("logName=\"{}\"", self.formatted_name);
        options.filter = Some(match options.filter.take().filter(|f| !f.is_empty()) {
            Some(filter) => format!("{own} AND {filter}"),
            None => own,
        });
        options
    }

    /// Reads entries of this log.
    ///
    /// # Errors
    ///
    /// See [`Logging::get_entries`].
    pub async fn get_entries(&self, options: GetEntriesOptions) -> Result<Page<Entry>> {
        self.logging.get_entries(self.scoped(options)).await
    }

    /// Streams entries of this log.
    #[must_use]
    pub fn get_entries_stream(&self, options: GetEntriesOptions) -> BoxStream<'static, Result<Entry>> {
        self.logging.get_entries_stream(self.scoped(options))
    }
}
