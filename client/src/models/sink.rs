//! Sink metadata and destinations.

use crate::convert::{datetime_to_timestamp, timestamp_to_datetime};
use crate::proto::v2::{self, log_sink::VersionFormat};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where a sink exports matching entries.
///
/// The bucket, dataset and topic objects themselves belong to the storage,
/// analytics and messaging clients; only their resource identifiers are
/// formatted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A storage bucket.
    Bucket(String),
    /// An analytics dataset.
    Dataset {
        /// Project owning the dataset.
        project: String,
        /// Dataset id.
        dataset: String,
    },
    /// A messaging topic.
    Topic {
        /// Project owning the topic.
        project: String,
        /// Topic id.
        topic: String,
    },
    /// A destination string used as given.
    Raw(String),
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bucket(bucket) => write!(f, "storage.googleapis.com/{bucket}"),
            Self::Dataset { project, dataset } => write!(
                f,
                "bigquery.googleapis.com/projects/{project}/datasets/{dataset}"
            ),
            Self::Topic { project, topic } => {
                write!(f, "pubsub.googleapis.com/projects/{project}/topics/{topic}")
            }
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        destination.to_string()
    }
}

/// Entry format a sink exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputVersionFormat {
    /// Let the service decide.
    #[default]
    Unspecified,
    /// `LogEntry` version 2.
    V2,
    /// `LogEntry` version 1.
    V1,
}

/// Configuration and server-assigned state of a sink.
///
/// # Example
///
/// ```
/// use cloud_logging::models::{Destination, SinkMetadata};
///
/// let metadata = SinkMetadata::new(Destination::Bucket("audit-archive".to_string()))
///     .with_filter("severity>=ERROR");
/// assert_eq!(metadata.destination, "storage.googleapis.com/audit-archive");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SinkMetadata {
    /// Sink id. Filled from the sink handle on create.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Export destination, see [`Destination`].
    #[validate(length(min = 1, message = "Sink destination cannot be empty"))]
    pub destination: String,

    /// Advanced logs filter selecting the exported entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the sink is disabled.
    #[serde(default)]
    pub disabled: bool,

    /// Exported entry format.
    #[serde(default)]
    pub output_version_format: OutputVersionFormat,

    /// Identity the service writes to the destination with. Set by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_identity: Option<String>,

    /// Whether entries of child resources are exported too.
    #[serde(default)]
    pub include_children: bool,

    /// Creation time. Set by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,

    /// Last update time. Set by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl SinkMetadata {
    /// Creates metadata exporting to the given destination.
    #[must_use]
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overlays the fields set in `update` onto `self`.
    ///
    /// Server-assigned fields (`writer_identity`, timestamps) are kept.
    #[must_use]
    pub fn merge(mut self, update: &SinkUpdate) -> Self {
        if let Some(destination) = &update.destination {
            self.destination.clone_from(destination);
        }
        if update.filter.is_some() {
            self.filter.clone_from(&update.filter);
        }
        if update.description.is_some() {
            self.description.clone_from(&update.description);
        }
        if let Some(disabled) = update.disabled {
            self.disabled = disabled;
        }
        if let Some(format) = update.output_version_format {
            self.output_version_format = format;
        }
        if let Some(include_children) = update.include_children {
            self.include_children = include_children;
        }
        self
    }

    /// Converts to the wire type under the given sink id.
    #[must_use]
    pub fn to_proto(&self, sink_id: &str) -> v2::LogSink {
        let format = match self.output_version_format {
            OutputVersionFormat::Unspecified => VersionFormat::Unspecified,
            OutputVersionFormat::V2 => VersionFormat::V2,
            OutputVersionFormat::V1 => VersionFormat::V1,
        };
        v2::LogSink {
            name: sink_id.to_string(),
            destination: self.destination.clone(),
            filter: self.filter.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            disabled: self.disabled,
            output_version_format: format as i32,
            writer_identity: self.writer_identity.clone().unwrap_or_default(),
            include_children: self.include_children,
            create_time: self.create_time.as_ref().map(datetime_to_timestamp),
            update_time: self.update_time.as_ref().map(datetime_to_timestamp),
        }
    }
}

/// Changes to apply to an existing sink.
///
/// Only the fields that are `Some` are sent, so a destination-only update
/// leaves `disabled` and `include_children` as they are on the service.
///
/// # Example
///
/// ```
/// use cloud_logging::models::SinkUpdate;
///
/// let update = SinkUpdate::new().with_filter("severity>=ERROR").with_disabled(true);
/// assert_eq!(update.update_paths(), vec!["filter", "disabled"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkUpdate {
    /// New export destination.
    pub destination: Option<String>,
    /// New filter.
    pub filter: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Enable or disable the sink.
    pub disabled: Option<bool>,
    /// New exported entry format.
    pub output_version_format: Option<OutputVersionFormat>,
    /// Export entries of child resources or not.
    pub include_children: Option<bool>,
}

impl SinkUpdate {
    /// Creates an update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the destination.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the disabled flag.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Sets the exported entry format.
    #[must_use]
    pub fn with_output_version_format(mut self, format: OutputVersionFormat) -> Self {
        self.output_version_format = Some(format);
        self
    }

    /// Sets the include-children flag.
    #[must_use]
    pub fn with_include_children(mut self, include_children: bool) -> Self {
        self.include_children = Some(include_children);
        self
    }

    /// `LogSink` field paths this update touches, in wire field order.
    #[must_use]
    pub fn update_paths(&self) -> Vec<&'static str> {
        [
            ("destination", self.destination.is_some()),
            ("filter", self.filter.is_some()),
            ("description", self.description.is_some()),
            ("disabled", self.disabled.is_some()),
            ("output_version_format", self.output_version_format.is_some()),
            ("include_children", self.include_children.is_some()),
        ]
        .into_iter()
        .filter_map(|(path, set)| set.then_some(path))
        .collect()
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.update_paths().is_empty()
    }
}

impl From<Destination> for SinkUpdate {
    fn from(destination: Destination) -> Self {
        Self::new().with_destination(destination)
    }
}

impl From<v2::LogSink> for SinkMetadata {
    fn from(sink: v2::LogSink) -> Self {
        let output_version_format = match VersionFormat::try_from(sink.output_version_format) {
            Ok(VersionFormat::V2) => OutputVersionFormat::V2,
            Ok(VersionFormat::V1) => OutputVersionFormat::V1,
            Ok(VersionFormat::Unspecified) | Err(_) => OutputVersionFormat::Unspecified,
        };
        Self {
            name: sink.name,
            destination: sink.destination,
            filter: Some(sink.filter).filter(|f| !f.is_empty()),
            description: Some(sink.description).filter(|d| !d.is_empty()),
            disabled: sink.disabled,
            output_version_format,
            writer_identity: Some(sink.writer_identity).filter(|w| !w.is_empty()),
            include_children: sink.include_children,
            create_time: sink.create_time.as_ref().and_then(timestamp_to_datetime),
            update_time: sink.update_time.as_ref().and_then(timestamp_to_datetime),
        }
    }
}
