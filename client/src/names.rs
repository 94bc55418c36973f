//! Resource-name helpers.
//!
//! Cloud Logging addresses everything by a slash-separated resource name:
//!
//! - project: `projects/{project}`
//! - log: `projects/{project}/logs/{log}` (the log id is URL-encoded)
//! - sink: `projects/{project}/sinks/{sink}`

use crate::error::{LoggingError, Result};

fn require(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LoggingError::InvalidArgument(format!(
            "A {kind} must be provided."
        )));
    }
    Ok(())
}

/// Formats the parent name for a project.
///
/// # Errors
///
/// Returns an error if the project id is empty.
pub fn project_name(project_id: &str) -> Result<String> {
    require("project id", project_id)?;
    Ok(format!("projects/{project_id}"))
}

/// Formats a fully-qualified log name.
///
/// Names already in `projects/{p}/logs/{l}` form are returned as given.
///
/// # Errors
///
/// Returns an error if the project id or the log name is empty.
///
/// # Example
///
/// ```
/// use cloud_logging::names::log_name;
///
/// assert_eq!(
///     log_name("my-project", "syslog").unwrap(),
///     "projects/my-project/logs/syslog"
/// );
/// assert_eq!(
///     log_name("my-project", "cloudaudit.googleapis.com/activity").unwrap(),
///     "projects/my-project/logs/cloudaudit.googleapis.com%2Factivity"
/// );
/// ```
pub fn log_name(project_id: &str, log: &str) -> Result<String> {
    require("log name", log)?;
    if is_qualified(log, "logs") {
        return Ok(log.to_string());
    }
    Ok(format!(
        "{}/logs/{}",
        project_name(project_id)?,
        urlencoding::encode(log)
    ))
}

/// Formats a fully-qualified sink name.
///
/// # Errors
///
/// Returns an error if the project id or the sink name is empty.
pub fn sink_name(project_id: &str, sink: &str) -> Result<String> {
    require("sink name", sink)?;
    if is_qualified(sink, "sinks") {
        return Ok(sink.to_string());
    }
    Ok(format!("{}/sinks/{sink}", project_name(project_id)?))
}

/// Extracts the short id from a qualified name (`projects/p/sinks/x` -> `x`).
///
/// Log ids are URL-decoded. Unqualified names are returned unchanged.
pub fn short_name(name: &str) -> String {
    let mut parts = name.splitn(4, '/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("projects"), Some(_), Some(collection), Some(id)) => {
            if collection == "logs" {
                urlencoding::decode(id).map_or_else(|_| id.to_string(), |s| s.into_owned())
            } else {
                id.to_string()
            }
        }
        _ => name.to_string(),
    }
}

fn is_qualified(name: &str, collection: &str) -> bool {
    let mut parts = name.splitn(4, '/');
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some("projects"), Some(p), Some(c), Some(id)) if !p.is_empty() && c == collection && !id.is_empty()
    )
}
