//! The [`Sink`] handle.

use crate::client::Logging;
use crate::error::Result;
use crate::models::{SinkMetadata, SinkUpdate};
use crate::names;
use crate::proto::v2;

/// A named sink within a project, with the last metadata seen.
///
/// # Example
///
/// ```
/// use cloud_logging::{Destination, Logging, SinkMetadata, transport::InMemoryTransport};
///
/// # tokio_test::block_on(async {
/// let logging = Logging::with_transport("my-project", InMemoryTransport::new_shared()).unwrap();
/// let mut sink = logging.sink("errors-to-gcs").unwrap();
/// sink.create(
///     SinkMetadata::new(Destination::Bucket("error-archive".to_string()))
///         .with_filter("severity>=ERROR"),
/// )
/// .await
/// .unwrap();
///
/// sink.set_filter("severity>=CRITICAL").await.unwrap();
/// assert_eq!(sink.metadata().unwrap().filter.as_deref(), Some("severity>=CRITICAL"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Sink {
    logging: Logging,
    name: String,
    formatted_name: String,
    metadata: Option<SinkMetadata>,
}

impl Sink {
    pub(crate) fn new(logging: Logging, name: &str, metadata: Option<SinkMetadata>) -> Result<Self> {
        let formatted_name = names::sink_name(logging.project_id(), name)?;
        Ok(Self {
            name: names::short_name(&formatted_name),
            formatted_name,
            logging,
            metadata,
        })
    }

    /// Sink id.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified name, `projects/{project}/sinks/{sink}`.
    #[must_use]
    pub fn formatted_name(&self) -> &str {
        &self.formatted_name
    }

    /// Last metadata received from the service, if any.
    #[must_use]
    pub fn metadata(&self) -> Option<&SinkMetadata> {
        self.metadata.as_ref()
    }

    /// Creates this sink on the service.
    ///
    /// # Errors
    ///
    /// See [`Logging::create_sink`].
    pub async fn create(&mut self, metadata: SinkMetadata) -> Result<&SinkMetadata> {
        let created = self.logging.create_sink(&self.name, metadata).await?;
        Ok(&*self.metadata.insert(created.metadata.unwrap_or_default()))
    }

    /// Deletes this sink.
    ///
    /// # Errors
    ///
    /// Returns the RPC failure, e.g. `NOT_FOUND`.
    pub async fn delete(&self) -> Result<()> {
        tracing::debug!(sink = %self.formatted_name, "Deleting sink");
        self.logging
            .transport()
            .delete_sink(v2::DeleteSinkRequest {
                sink_name: self.formatted_name.clone(),
            })
            .await?;
        Ok(())
    }

    /// Fetches the current metadata and caches it.
    ///
    /// # Errors
    ///
    /// Returns the RPC failure, e.g. `NOT_FOUND`.
    pub async fn get_metadata(&mut self) -> Result<&SinkMetadata> {
        let sink = self
            .logging
            .transport()
            .get_sink(v2::GetSinkRequest {
                sink_name: self.formatted_name.clone(),
            })
            .await?;
        Ok(&*self.metadata.insert(SinkMetadata::from(sink)))
    }

    /// Replaces the filter, keeping everything else.
    ///
    /// # Errors
    ///
    /// See [`Sink::set_metadata`].
    pub async fn set_filter(&mut self, filter: impl Into<String>) -> Result<&SinkMetadata> {
        self.set_metadata(SinkUpdate::new().with_filter(filter)).await
    }

    /// Applies the fields set in `update` to the current sink.
    ///
    /// The update mask names only those fields. An empty update just
    /// refreshes the cached metadata.
    ///
    /// # Errors
    ///
    /// Returns the RPC failure of the read or the update.
    pub async fn set_metadata(&mut self, update: SinkUpdate) -> Result<&SinkMetadata> {
        let current = self.get_metadata().await?.clone();
        if update.is_empty() {
            return Ok(&*self.metadata.insert(current));
        }

        let request = v2::UpdateSinkRequest {
            sink_name: self.formatted_name.clone(),
            sink: Some(current.merge(&update).to_proto(&self.name)),
            unique_writer_identity: false,
            update_mask: Some(prost_types::FieldMask {
                paths: update.update_paths().into_iter().map(String::from).collect(),
            }),
        };
        tracing::debug!(sink = %self.formatted_name, paths = ?update.update_paths(), "Updating sink");
        let sink = self.logging.transport().update_sink(request).await?;
        Ok(&*self.metadata.insert(SinkMetadata::from(sink)))
    }
}
