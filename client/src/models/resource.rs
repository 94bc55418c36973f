//! Monitored resource descriptor.

use crate::proto::api;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies the origin of log entries: a resource type plus labels.
///
/// # Example
///
/// ```
/// use cloud_logging::models::MonitoredResource;
///
/// let resource = MonitoredResource::new("gce_instance")
///     .with_label("instanceId", "1234")
///     .with_label("zone", "us-central1-a");
///
/// let normalized = resource.normalized();
/// assert_eq!(normalized.labels["instance_id"], "1234");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredResource {
    /// Resource type, e.g. `global`, `gce_instance`, `cloud_function`.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Labels identifying the resource instance.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl MonitoredResource {
    /// Creates a resource of the given type with no labels.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            labels: HashMap::new(),
        }
    }

    /// The `global` resource the service uses when nothing better is known.
    #[must_use]
    pub fn global() -> Self {
        Self::new("global")
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns a copy with every label key converted to snake_case.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            resource_type: self.resource_type.clone(),
            labels: self
                .labels
                .iter()
                .map(|(k, v)| (to_snake_case(k), v.clone()))
                .collect(),
        }
    }

    /// Converts to the wire type, normalizing label keys.
    #[must_use]
    pub fn to_proto(&self) -> api::MonitoredResource {
        let normalized = self.normalized();
        api::MonitoredResource {
            r#type: normalized.resource_type,
            labels: normalized.labels,
        }
    }
}

impl From<api::MonitoredResource> for MonitoredResource {
    fn from(resource: api::MonitoredResource) -> Self {
        Self {
            resource_type: resource.r#type,
            labels: resource.labels,
        }
    }
}

/// Converts a label key to snake_case.
///
/// `instanceId` -> `instance_id`, `projectID` -> `project_id`,
/// `HTTPServer` -> `http_server`, `zone-name` -> `zone_name`.
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '.' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
