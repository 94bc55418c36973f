//! Log entry model.
//!
//! An [`Entry`] is built client side from metadata plus data, and is only
//! converted to its wire form right before it is sent.

use crate::convert::{
    datetime_to_timestamp, json_object_to_struct, struct_to_json_object, timestamp_to_datetime,
};
use crate::error::EntryError;
use crate::models::{HttpRequest, MonitoredResource, Severity};
use crate::proto::v2::{self, log_entry};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Data carried by an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Plain text, sent as `textPayload`.
    Text(String),
    /// A structured object, sent as `jsonPayload`.
    Json(serde_json::Value),
    /// A serialized protocol buffer, sent as `protoPayload`.
    Proto(ProtoPayload),
    /// No payload at all.
    Empty,
}

/// A serialized protocol buffer message and its type URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoPayload {
    /// Type URL, e.g. `type.googleapis.com/google.cloud.audit.AuditLog`.
    pub type_url: String,
    /// Encoded message bytes.
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<prost_types::Any> for Payload {
    fn from(any: prost_types::Any) -> Self {
        Self::Proto(ProtoPayload {
            type_url: any.type_url,
            value: any.value,
        })
    }
}

/// Identifies a long-running operation an entry belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation identifier, unique within the producer.
    pub id: String,
    /// Arbitrary producer identifier.
    pub producer: String,
    /// Set on the first entry of the operation.
    #[serde(default)]
    pub first: bool,
    /// Set on the last entry of the operation.
    #[serde(default)]
    pub last: bool,
}

/// Source code location that produced an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file name.
    pub file: String,
    /// Line within the file, 1-based.
    #[serde(default)]
    pub line: i64,
    /// Human-readable function or method name.
    #[serde(default)]
    pub function: String,
}

/// Metadata describing a log entry.
///
/// Everything is optional; unset fields are left for the service to fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Fully-qualified log name. Set by the service on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_name: Option<String>,

    /// Resource that produced the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<MonitoredResource>,

    /// Time the event described by the entry occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Time the service received the entry. Set by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_timestamp: Option<DateTime<Utc>>,

    /// Severity of the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Unique identifier used by the service to de-duplicate entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,

    /// HTTP request associated with the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_request: Option<HttpRequest>,

    /// User-defined labels.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,

    /// Long-running operation the entry belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,

    /// Trace resource name, `projects/{project}/traces/{trace_id}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,

    /// Span id within the trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    /// Whether the trace was sampled.
    #[serde(default)]
    pub trace_sampled: bool,

    /// Source location that produced the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
}

impl EntryMetadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the monitored resource.
    #[must_use]
    pub fn with_resource(mut self, resource: MonitoredResource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Sets the event timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Adds a user label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Sets the insert id.
    #[must_use]
    pub fn with_insert_id(mut self, insert_id: impl Into<String>) -> Self {
        self.insert_id = Some(insert_id.into());
        self
    }

    /// Sets the HTTP request.
    #[must_use]
    pub fn with_http_request(mut self, http_request: HttpRequest) -> Self {
        self.http_request = Some(http_request);
        self
    }

    /// Sets the operation.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets trace correlation.
    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>, span_id: Option<String>) -> Self {
        self.trace = Some(trace.into());
        self.span_id = span_id;
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source_location(mut self, location: SourceLocation) -> Self {
        self.source_location = Some(location);
        self
    }
}

/// A single log record.
///
/// # Example
///
/// ```
/// use cloud_logging::models::{Entry, EntryMetadata, Severity};
/// use serde_json::json;
///
/// let text = Entry::new("Server started");
/// assert!(text.metadata.timestamp.is_some());
///
/// let structured = Entry::with_metadata(
///     EntryMetadata::new().with_severity(Severity::Error),
///     json!({"user": "alice", "action": "login"}),
/// );
/// let wire = structured.to_proto().unwrap();
/// assert_eq!(wire.severity, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry metadata.
    pub metadata: EntryMetadata,
    /// Entry data.
    pub data: Payload,
}

impl Entry {
    /// Creates an entry with default metadata, timestamped now.
    #[must_use]
    pub fn new(data: impl Into<Payload>) -> Self {
        Self::with_metadata(EntryMetadata::default(), data)
    }

    /// Creates an entry from metadata and data.
    ///
    /// A missing timestamp is set to now.
    #[must_use]
    pub fn with_metadata(mut metadata: EntryMetadata, data: impl Into<Payload>) -> Self {
        if metadata.timestamp.is_none() {
            metadata.timestamp = Some(Utc::now());
        }
        Self {
            metadata,
            data: data.into(),
        }
    }

    /// Creates a JSON entry from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` cannot be represented as JSON.
    pub fn from_serialize<T: Serialize + ?Sized>(
        metadata: EntryMetadata,
        data: &T,
    ) -> Result<Self, EntryError> {
        let value = serde_json::to_value(data)?;
        Ok(Self::with_metadata(metadata, value))
    }

    /// Returns a copy of this entry with the given severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.metadata.severity = Some(severity);
        self
    }

    /// Converts the entry to its wire form.
    ///
    /// JSON objects become `jsonPayload`, JSON strings become `textPayload`.
    /// Any other JSON value is an error rather than an entry sent without a
    /// payload, so [`Log::write`](crate::log::Log::write) drops such entries
    /// and counts them in [`WriteOutcome::dropped`](crate::log::WriteOutcome).
    /// Wrap scalars and arrays in an object to keep them, or use
    /// [`Payload::Empty`] for an entry that carries only metadata.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::UnsupportedPayload`] for JSON arrays, numbers,
    /// booleans and null, which have no wire representation as a payload.
    pub fn to_proto(&self) -> Result<v2::LogEntry, EntryError> {
        let payload = match &self.data {
            Payload::Text(text) => Some(log_entry::Payload::TextPayload(text.clone())),
            Payload::Json(serde_json::Value::Object(map)) => {
                Some(log_entry::Payload::JsonPayload(json_object_to_struct(map)))
            }
            Payload::Json(serde_json::Value::String(text)) => {
                Some(log_entry::Payload::TextPayload(text.clone()))
            }
            Payload::Json(serde_json::Value::Array(_)) => {
                return Err(EntryError::UnsupportedPayload("JSON array"));
            }
            Payload::Json(serde_json::Value::Number(_)) => {
                return Err(EntryError::UnsupportedPayload("JSON number"));
            }
            Payload::Json(serde_json::Value::Bool(_)) => {
                return Err(EntryError::UnsupportedPayload("JSON boolean"));
            }
            Payload::Json(serde_json::Value::Null) => {
                return Err(EntryError::UnsupportedPayload("JSON null"));
            }
            Payload::Proto(proto) => Some(log_entry::Payload::ProtoPayload(prost_types::Any {
                type_url: proto.type_url.clone(),
                value: proto.value.clone(),
            })),
            Payload::Empty => None,
        };

        let meta = &self.metadata;
        Ok(v2::LogEntry {
            log_name: meta.log_name.clone().unwrap_or_default(),
            resource: meta.resource.as_ref().map(MonitoredResource::to_proto),
            timestamp: meta.timestamp.as_ref().map(datetime_to_timestamp),
            receive_timestamp: None,
            severity: meta.severity.unwrap_or_default().as_i32(),
            insert_id: meta.insert_id.clone().unwrap_or_default(),
            http_request: meta.http_request.as_ref().map(HttpRequest::to_proto),
            labels: meta.labels.clone(),
            operation: meta.operation.as_ref().map(|op| v2::LogEntryOperation {
                id: op.id.clone(),
                producer: op.producer.clone(),
                first: op.first,
                last: op.last,
            }),
            trace: meta.trace.clone().unwrap_or_default(),
            span_id: meta.span_id.clone().unwrap_or_default(),
            trace_sampled: meta.trace_sampled,
            source_location: meta
                .source_location
                .as_ref()
                .map(|loc| v2::LogEntrySourceLocation {
                    file: loc.file.clone(),
                    line: loc.line,
                    function: loc.function.clone(),
                }),
            payload,
        })
    }

    /// Builds an entry from a wire entry returned by the service.
    #[must_use]
    pub fn from_proto(entry: v2::LogEntry) -> Self {
        let data = match entry.payload {
            Some(log_entry::Payload::TextPayload(text)) => Payload::Text(text),
            Some(log_entry::Payload::JsonPayload(s)) => {
                Payload::Json(serde_json::Value::Object(struct_to_json_object(&s)))
            }
            Some(log_entry::Payload::ProtoPayload(any)) => Payload::from(any),
            None => Payload::Empty,
        };

        let metadata = EntryMetadata {
            log_name: non_empty(entry.log_name),
            resource: entry.resource.map(MonitoredResource::from),
            timestamp: entry.timestamp.as_ref().and_then(timestamp_to_datetime),
            receive_timestamp: entry
                .receive_timestamp
                .as_ref()
                .and_then(timestamp_to_datetime),
            severity: Some(Severity::from_i32(entry.severity)),
            insert_id: non_empty(entry.insert_id),
            http_request: entry.http_request.map(HttpRequest::from),
            labels: entry.labels,
            operation: entry.operation.map(|op| Operation {
                id: op.id,
                producer: op.producer,
                first: op.first,
                last: op.last,
            }),
            trace: non_empty(entry.trace),
            span_id: non_empty(entry.span_id),
            trace_sampled: entry.trace_sampled,
            source_location: entry.source_location.map(|loc| SourceLocation {
                file: loc.file,
                line: loc.line,
                function: loc.function,
            }),
        };

        Self { metadata, data }
    }

    /// Returns the payload rendered as a single line of text.
    #[must_use]
    pub fn payload_text(&self) -> String {
        match &self.data {
            Payload::Text(text) => text.clone(),
            Payload::Json(value) => value.to_string(),
            Payload::Proto(proto) => format!(
                "{} ({})",
                proto.type_url,
                base64::engine::general_purpose::STANDARD.encode(&proto.value)
            ),
            Payload::Empty => String::new(),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_entry_new_defaults_metadata() {
        let entry = Entry::new("hello");

        assert_eq!(entry.data, Payload::Text("hello".to_string()));
        assert!(entry.metadata.timestamp.is_some());
        assert!(entry.metadata.severity.is_none());
        assert!(entry.metadata.resource.is_none());
        assert!(entry.metadata.labels.is_empty());
    }

    #[test]
    fn test_entry_with_metadata_keeps_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let entry = Entry::with_metadata(EntryMetadata::new().with_timestamp(ts), "x");
        assert_eq!(entry.metadata.timestamp, Some(ts));
    }

    #[test]
    fn test_text_payload_to_proto() {
        let entry = Entry::with_metadata(
            EntryMetadata::new()
                .with_severity(Severity::Warning)
                .with_label("env", "prod")
                .with_insert_id("abc"),
            "disk almost full",
        );
        let wire = entry.to_proto().unwrap();

        assert_eq!(
            wire.payload,
            Some(log_entry::Payload::TextPayload("disk almost full".to_string()))
        );
        assert_eq!(wire.severity, 400);
        assert_eq!(wire.labels["env"], "prod");
        assert_eq!(wire.insert_id, "abc");
        assert!(wire.timestamp.is_some());
        assert!(wire.resource.is_none());
    }

    #[test]
    fn test_json_object_to_proto() {
        let entry = Entry::new(json!({"user": "alice", "attempts": 3}));
        let wire = entry.to_proto().unwrap();

        match wire.payload {
            Some(log_entry::Payload::JsonPayload(s)) => {
                assert_eq!(s.fields.len(), 2);
                assert!(s.fields.contains_key("user"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_json_string_becomes_text() {
        let entry = Entry::new(json!("just text"));
        let wire = entry.to_proto().unwrap();
        assert_eq!(
            wire.payload,
            Some(log_entry::Payload::TextPayload("just text".to_string()))
        );
    }

    #[test]
    fn test_unsupported_json_shapes_fail() {
        for value in [json!([1, 2]), json!(42), json!(true), serde_json::Value::Null] {
            let entry = Entry::new(value);
            assert!(matches!(
                entry.to_proto(),
                Err(EntryError::UnsupportedPayload(_))
            ));
        }
    }

    #[test]
    fn test_resource_labels_are_snake_cased() {
        let entry = Entry::with_metadata(
            EntryMetadata::new()
                .with_resource(MonitoredResource::new("gce_instance").with_label("instanceId", "7")),
            "x",
        );
        let wire = entry.to_proto().unwrap();
        let resource = wire.resource.unwrap();
        assert_eq!(resource.labels["instance_id"], "7");
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
            ok: bool,
        }

        let entry =
            Entry::from_serialize(EntryMetadata::new(), &Login { user: "bob", ok: true }).unwrap();
        assert_eq!(entry.data, Payload::Json(json!({"user": "bob", "ok": true})));
    }

    #[test]
    fn test_from_serialize_rejects_non_string_keys() {
        let mut data = std::collections::BTreeMap::new();
        data.insert(vec![1u8], "value");
        let result = Entry::from_serialize(EntryMetadata::new(), &data);
        assert!(matches!(result, Err(EntryError::Serialize(_))));
    }

    #[test]
    fn test_from_proto_decodes_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let original = Entry::with_metadata(
            EntryMetadata::new()
                .with_severity(Severity::Critical)
                .with_timestamp(ts)
                .with_trace("projects/p/traces/t1", Some("s1".to_string()))
                .with_operation(Operation {
                    id: "op".to_string(),
                    producer: "batch".to_string(),
                    first: true,
                    last: false,
                }),
            json!({"nested": {"count": 2}}),
        );

        let mut wire = original.to_proto().unwrap();
        wire.log_name = "projects/p/logs/app".to_string();
        let decoded = Entry::from_proto(wire);

        assert_eq!(decoded.data, original.data);
        assert_eq!(decoded.metadata.severity, Some(Severity::Critical));
        assert_eq!(decoded.metadata.timestamp, Some(ts));
        assert_eq!(decoded.metadata.log_name.as_deref(), Some("projects/p/logs/app"));
        assert_eq!(decoded.metadata.trace.as_deref(), Some("projects/p/traces/t1"));
        assert_eq!(decoded.metadata.span_id.as_deref(), Some("s1"));
        assert_eq!(decoded.metadata.operation.unwrap().producer, "batch");
        assert!(decoded.metadata.insert_id.is_none());
    }

    #[test]
    fn test_from_proto_without_payload() {
        let decoded = Entry::from_proto(v2::LogEntry::default());
        assert_eq!(decoded.data, Payload::Empty);
        assert_eq!(decoded.metadata.severity, Some(Severity::Default));
    }

    #[test]
    fn test_proto_payload_serializes_as_base64() {
        let entry = Entry::new(prost_types::Any {
            type_url: "type.googleapis.com/test.Msg".to_string(),
            value: vec![1, 2, 3],
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["data"]["proto"]["value"], "AQID");
        assert_eq!(entry.payload_text(), "type.googleapis.com/test.Msg (AQID)");
    }
}
