//! In-process emulation of the Cloud Logging service.
//!
//! Stores written entries and sinks in memory and answers reads the way the
//! service does, for a subset of its filter language:
//!
//! - `logName="projects/p/logs/name"`
//! - `severity>=LEVEL` (also `>`, `=`, `<=`, `<`)
//!
//! joined with `AND`. Any other term is rejected with `INVALID_ARGUMENT`.
//!
//! **Note:** Data is not persisted across restarts.

use super::LoggingTransport;
use crate::convert::datetime_to_timestamp;
use crate::models::Severity;
use crate::names;
use crate::proto::{api, v2};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tonic::Status;

const DEFAULT_PAGE_SIZE: usize = 1000;
const SHARED_WRITER_IDENTITY: &str = "serviceAccount:cloud-logs@system.gserviceaccount.com";

/// In-memory transport.
///
/// # Example
///
/// ```
/// use cloud_logging::transport::{InMemoryTransport, LoggingTransport};
/// use cloud_logging::proto::v2;
///
/// # tokio_test::block_on(async {
/// let transport = InMemoryTransport::new();
/// transport
///     .write_log_entries(v2::WriteLogEntriesRequest {
///         log_name: "projects/p/logs/app".to_string(),
///         entries: vec![v2::LogEntry::default()],
///         ..Default::default()
///     })
///     .await
///     .unwrap();
/// assert_eq!(transport.entries().len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    entries: RwLock<Vec<v2::LogEntry>>,
    sinks: RwLock<BTreeMap<String, v2::LogSink>>,
    write_requests: RwLock<Vec<v2::WriteLogEntriesRequest>>,
    next_failure: Mutex<Option<Status>>,
    insert_ids: AtomicU64,
}

impl InMemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty transport wrapped in an `Arc`.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns every stored entry in write order.
    #[must_use]
    pub fn entries(&self) -> Vec<v2::LogEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Returns every write request received, including dry runs.
    #[must_use]
    pub fn write_requests(&self) -> Vec<v2::WriteLogEntriesRequest> {
        self.write_requests
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Makes the next call fail with `status`.
    pub fn fail_next(&self, status: Status) {
        if let Ok(mut next) = self.next_failure.lock() {
            *next = Some(status);
        }
    }

    fn check_failure(&self) -> Result<(), Status> {
        let mut next = self.next_failure.lock().map_err(|_| lock_error())?;
        match next.take() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

fn lock_error() -> Status {
    Status::internal("Failed to acquire lock on in-memory transport")
}

fn parse_page_token(token: &str) -> Result<usize, Status> {
    if token.is_empty() {
        return Ok(0);
    }
    token
        .parse()
        .map_err(|_| Status::invalid_argument(format!("Invalid page token: {token}")))
}

fn page_size(requested: i32) -> usize {
    usize::try_from(requested)
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Slices `items` into one page, returning the page and the next token.
fn paginate<T: Clone>(items: &[T], token: &str, size: i32) -> Result<(Vec<T>, String), Status> {
    let offset = parse_page_token(token)?;
    let end = offset.saturating_add(page_size(size)).min(items.len());
    let page = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
    let next = if end < items.len() {
        end.to_string()
    } else {
        String::new()
    };
    Ok((page, next))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

#[derive(Debug)]
enum Term {
    LogName(String),
    Severity(Comparison, i32),
}

/// Parses the supported subset of the logging filter language.
fn parse_filter(filter: &str) -> Result<Vec<Term>, Status> {
    filter
        .split(" AND ")
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(parse_term)
        .collect()
}

fn parse_term(term: &str) -> Result<Term, Status> {
    let unsupported = || Status::invalid_argument(format!("Unsupported filter term: {term}"));

    if let Some(value) = term.strip_prefix("logName=") {
        return Ok(Term::LogName(value.trim_matches('"').to_string()));
    }

    if let Some(rest) = term.strip_prefix("severity") {
        let (op, value) = [
            (">=", Comparison::Ge),
            ("<=", Comparison::Le),
            (">", Comparison::Gt),
            ("<", Comparison::Lt),
            ("=", Comparison::Eq),
        ]
        .into_iter()
        .find_map(|(prefix, op)| rest.strip_prefix(prefix).map(|v| (op, v)))
        .ok_or_else(unsupported)?;
        let severity: Severity = value
            .trim()
            .trim_matches('"')
            .parse()
            .map_err(|_| unsupported())?;
        return Ok(Term::Severity(op, severity.as_i32()));
    }

    Err(unsupported())
}

fn matches(entry: &v2::LogEntry, terms: &[Term]) -> bool {
    terms.iter().all(|term| match term {
        Term::LogName(name) => &entry.log_name == name,
        Term::Severity(op, level) => {
            let sev = entry.severity;
            match op {
                Comparison::Lt => sev < *level,
                Comparison::Le => sev <= *level,
                Comparison::Eq => sev == *level,
                Comparison::Ge => sev >= *level,
                Comparison::Gt => sev > *level,
            }
        }
    })
}

fn timestamp_key(entry: &v2::LogEntry) -> (i64, i32) {
    entry
        .timestamp
        .as_ref()
        .map_or((0, 0), |ts| (ts.seconds, ts.nanos))
}

fn now() -> prost_types::Timestamp {
    datetime_to_timestamp(&Utc::now())
}

fn project_of(parent: &str) -> Result<&str, Status> {
    parent
        .strip_prefix("projects/")
        .filter(|p| !p.is_empty() && !p.contains('/'))
        .ok_or_else(|| Status::invalid_argument(format!("Invalid parent: {parent}")))
}

#[tonic::async_trait]
impl LoggingTransport for InMemoryTransport {
    async fn write_log_entries(
        &self,
        request: v2::WriteLogEntriesRequest,
    ) -> Result<v2::WriteLogEntriesResponse, Status> {
        self.check_failure()?;
        self.write_requests
            .write()
            .map_err(|_| lock_error())?
            .push(request.clone());

        if request.entries.is_empty() {
            return Err(Status::invalid_argument("No entries to write"));
        }

        let received = now();
        let mut accepted = Vec::with_capacity(request.entries.len());
        for mut entry in request.entries {
            if entry.log_name.is_empty() {
                entry.log_name.clone_from(&request.log_name);
            }
            if entry.log_name.is_empty() {
                return Err(Status::invalid_argument("Log name is required"));
            }
            if entry.resource.is_none() {
                entry.resource = Some(request.resource.clone().unwrap_or_else(|| {
                    api::MonitoredResource {
                        r#type: "global".to_string(),
                        labels: std::collections::HashMap::new(),
                    }
                }));
            }
            for (key, value) in &request.labels {
                entry
                    .labels
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
            if entry.timestamp.is_none() {
                entry.timestamp = Some(received);
            }
            entry.receive_timestamp = Some(received);
            if entry.insert_id.is_empty() {
                let id = self.insert_ids.fetch_add(1, Ordering::Relaxed);
                entry.insert_id = format!("{id:016x}");
            }
            accepted.push(entry);
        }

        tracing::debug!(
            log_name = %request.log_name,
            count = accepted.len(),
            dry_run = request.dry_run,
            "In-memory write"
        );

        if !request.dry_run {
            self.entries
                .write()
                .map_err(|_| lock_error())?
                .extend(accepted);
        }
        Ok(v2::WriteLogEntriesResponse {})
    }

    async fn list_log_entries(
        &self,
        request: v2::ListLogEntriesRequest,
    ) -> Result<v2::ListLogEntriesResponse, Status> {
        self.check_failure()?;
        if request.resource_names.is_empty() {
            return Err(Status::invalid_argument("resource_names must not be empty"));
        }
        let terms = parse_filter(&request.filter)?;
        let descending = match request.order_by.trim() {
            "" | "timestamp asc" | "timestamp" => false,
            "timestamp desc" => true,
            other => {
                return Err(Status::invalid_argument(format!(
                    "Unsupported order_by: {other}"
                )))
            }
        };

        let prefixes: Vec<String> = request
            .resource_names
            .iter()
            .map(|r| format!("{r}/logs/"))
            .collect();

        let mut matching: Vec<v2::LogEntry> = self
            .entries
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .filter(|e| prefixes.iter().any(|p| e.log_name.starts_with(p)))
            .filter(|e| matches(e, &terms))
            .cloned()
            .collect();

        matching.sort_by_key(timestamp_key);
        if descending {
            matching.reverse();
        }

        let (entries, next_page_token) =
            paginate(&matching, &request.page_token, request.page_size)?;
        Ok(v2::ListLogEntriesResponse {
            entries,
            next_page_token,
        })
    }

    async fn delete_log(&self, request: v2::DeleteLogRequest) -> Result<(), Status> {
        self.check_failure()?;
        let mut entries = self.entries.write().map_err(|_| lock_error())?;
        let before = entries.len();
        entries.retain(|e| e.log_name != request.log_name);
        if entries.len() == before {
            return Err(Status::not_found(format!(
                "Log {} does not exist",
                request.log_name
            )));
        }
        Ok(())
    }

    async fn list_logs(&self, request: v2::ListLogsRequest) -> Result<v2::ListLogsResponse, Status> {
        self.check_failure()?;
        project_of(&request.parent)?;
        let prefix = format!("{}/logs/", request.parent);
        let mut names: Vec<String> = self
            .entries
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .filter(|e| e.log_name.starts_with(&prefix))
            .map(|e| e.log_name.clone())
            .collect();
        names.sort();
        names.dedup();

        let (log_names, next_page_token) =
            paginate(&names, &request.page_token, request.page_size)?;
        Ok(v2::ListLogsResponse {
            log_names,
            next_page_token,
        })
    }

    async fn create_sink(&self, request: v2::CreateSinkRequest) -> Result<v2::LogSink, Status> {
        self.check_failure()?;
        let project = project_of(&request.parent)?;
        let mut sink = request
            .sink
            .ok_or_else(|| Status::invalid_argument("Sink is required"))?;
        if sink.name.is_empty() {
            return Err(Status::invalid_argument("Sink name is required"));
        }
        if sink.destination.is_empty() {
            return Err(Status::invalid_argument("Sink destination is required"));
        }

        let full_name = names::sink_name(project, &sink.name)
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        let mut sinks = self.sinks.write().map_err(|_| lock_error())?;
        if sinks.contains_key(&full_name) {
            return Err(Status::already_exists(format!(
                "Sink {} already exists",
                sink.name
            )));
        }

        let created = now();
        sink.writer_identity = if request.unique_writer_identity {
            format!(
                "serviceAccount:{}@{project}.iam.gserviceaccount.com",
                sink.name
            )
        } else {
            SHARED_WRITER_IDENTITY.to_string()
        };
        sink.create_time = Some(created);
        sink.update_time = Some(created);
        sinks.insert(full_name, sink.clone());
        Ok(sink)
    }

    async fn get_sink(&self, request: v2::GetSinkRequest) -> Result<v2::LogSink, Status> {
        self.check_failure()?;
        self.sinks
            .read()
            .map_err(|_| lock_error())?
            .get(&request.sink_name)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("Sink {} does not exist", request.sink_name)))
    }

    async fn update_sink(&self, request: v2::UpdateSinkRequest) -> Result<v2::LogSink, Status> {
        self.check_failure()?;
        let update = request
            .sink
            .ok_or_else(|| Status::invalid_argument("Sink is required"))?;
        let mut sinks = self.sinks.write().map_err(|_| lock_error())?;
        let current = sinks.get_mut(&request.sink_name).ok_or_else(|| {
            Status::not_found(format!("Sink {} does not exist", request.sink_name))
        })?;

        let paths: Vec<String> = request
            .update_mask
            .map(|m| m.paths)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| {
                ["destination", "filter", "output_version_format"]
                    .map(str::to_string)
                    .to_vec()
            });

        for path in &paths {
            match path.as_str() {
                "destination" => current.destination.clone_from(&update.destination),
                "filter" => current.filter.clone_from(&update.filter),
                "description" => current.description.clone_from(&update.description),
                "disabled" => current.disabled = update.disabled,
                "output_version_format" => {
                    current.output_version_format = update.output_version_format;
                }
                "include_children" => current.include_children = update.include_children,
                other => {
                    return Err(Status::invalid_argument(format!(
                        "Unsupported update_mask path: {other}"
                    )))
                }
            }
        }
        if current.destination.is_empty() {
            return Err(Status::invalid_argument("Sink destination is required"));
        }
        current.update_time = Some(now());
        Ok(current.clone())
    }

    async fn delete_sink(&self, request: v2::DeleteSinkRequest) -> Result<(), Status> {
        self.check_failure()?;
        self.sinks
            .write()
            .map_err(|_| lock_error())?
            .remove(&request.sink_name)
            .map(|_| ())
            .ok_or_else(|| Status::not_found(format!("Sink {} does not exist", request.sink_name)))
    }

    async fn list_sinks(&self, request: v2::ListSinksRequest) -> Result<v2::ListSinksResponse, Status> {
        self.check_failure()?;
        project_of(&request.parent)?;
        let prefix = format!("{}/sinks/", request.parent);
        let all: Vec<v2::LogSink> = self
            .sinks
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(_, sink)| sink.clone())
            .collect();

        let (sinks, next_page_token) = paginate(&all, &request.page_token, request.page_size)?;
        Ok(v2::ListSinksResponse {
            sinks,
            next_page_token,
        })
    }
}
