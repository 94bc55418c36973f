//! Integration tests for the top-level client.
//!
//! Tests cover:
//! - Entry reads across logs, ordering and pagination
//! - Default resource detection on write
//! - Listing logs
//! - Error pass-through

use cloud_logging::resource::{EnvironmentDetector, FixedResource, ResourceDetector};
use cloud_logging::{
    Entry, GetEntriesOptions, Logging, LoggingError, MonitoredResource, Severity, WriteOptions,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::common::{test_client, text_entry, PROJECT};

async fn seed(logging: &Logging, log: &str, count: i64) {
    let entries: Vec<Entry> = (0..count)
        .map(|i| text_entry(&format!("{log} {i}"), Severity::Info, i))
        .collect();
    logging
        .log(log)
        .unwrap()
        .write(entries, WriteOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_entries_defaults_to_newest_first() {
    let (logging, _transport) = test_client();
    seed(&logging, "app", 3).await;

    let page = logging
        .get_entries(GetEntriesOptions::default())
        .await
        .unwrap();
    let texts: Vec<String> = page.items.iter().map(Entry::payload_text).collect();
    assert_eq!(texts, vec!["app 2", "app 1", "app 0"]);
    assert!(page.next_page_token.is_none());
}

#[tokio::test]
async fn test_get_entries_max_results_across_pages() {
    let (logging, _transport) = test_client();
    seed(&logging, "app", 10).await;

    let page = logging
        .get_entries(
            GetEntriesOptions::default()
                .with_order_by("timestamp asc")
                .with_page_size(3)
                .with_max_results(7),
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 7);
    assert_eq!(page.items[6].payload_text(), "app 6");
}

#[tokio::test]
async fn test_get_entries_manual_pagination() {
    let (logging, _transport) = test_client();
    seed(&logging, "app", 5).await;

    let options = GetEntriesOptions::default()
        .with_order_by("timestamp asc")
        .with_page_size(2)
        .with_auto_paginate(false);

    let first = logging.get_entries(options.clone()).await.unwrap();
    assert_eq!(first.items.len(), 2);
    let token = first.next_page_token.expect("more pages");

    let second = logging
        .get_entries(options.with_page_token(token))
        .await
        .unwrap();
    let texts: Vec<String> = second.items.iter().map(Entry::payload_text).collect();
    assert_eq!(texts, vec!["app 2", "app 3"]);
    assert!(second.next_page_token.is_some());
}

#[tokio::test]
async fn test_get_entries_stream_fetches_pages_on_demand() {
    let (logging, transport) = test_client();
    seed(&logging, "app", 6).await;

    let mut stream = logging.get_entries_stream(GetEntriesOptions::default().with_page_size(2));
    assert_eq!(stream.next().await.unwrap().unwrap().payload_text(), "app 5");

    transport.fail_next(tonic::Status::unavailable("backend down"));
    // Second entry comes from the buffered first page.
    assert_eq!(stream.next().await.unwrap().unwrap().payload_text(), "app 4");
    assert!(stream.next().await.unwrap().is_err());
}

#[tokio::test]
async fn test_get_entries_rejects_unsupported_filter() {
    let (logging, _transport) = test_client();
    let err = logging
        .get_entries(GetEntriesOptions::default().with_filter("textPayload:oops"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoggingError::Rpc(status) if status.code() == tonic::Code::InvalidArgument));
}

#[tokio::test]
async fn test_get_entries_from_other_resource() {
    let (logging, _transport) = test_client();
    seed(&logging, "app", 2).await;

    let page = logging
        .get_entries(GetEntriesOptions {
            resource_names: vec!["projects/other-project".to_string()],
            ..GetEntriesOptions::default()
        })
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_default_resource_applied_to_writes() {
    let (logging, transport) = test_client();
    let logging = logging.with_resource_detector(Arc::new(FixedResource(
        MonitoredResource::new("cloud_function").with_label("functionName", "resize"),
    )));

    let log = logging.log("fn").unwrap();
    log.info("first", WriteOptions::default()).await.unwrap();
    log.info(
        "second",
        WriteOptions::default().with_resource(MonitoredResource::global()),
    )
    .await
    .unwrap();

    let requests = transport.write_requests();
    let detected = requests[0].resource.as_ref().unwrap();
    assert_eq!(detected.r#type, "cloud_function");
    assert_eq!(detected.labels["function_name"], "resize");
    assert_eq!(requests[1].resource.as_ref().unwrap().r#type, "global");
}

/// A detector that always fails, counting its calls.
#[derive(Default)]
struct BrokenDetector {
    calls: AtomicUsize,
}

#[tonic::async_trait]
impl ResourceDetector for BrokenDetector {
    async fn detect(&self) -> cloud_logging::Result<MonitoredResource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LoggingError::ResourceDetection("metadata server down".to_string()))
    }
}

#[tokio::test]
async fn test_failed_detection_writes_without_resource() {
    let (logging, transport) = test_client();
    let detector = EnvironmentDetector::new()
        .unwrap()
        .with_env(|key| (key == "KUBERNETES_SERVICE_HOST").then(|| "10.0.0.1".to_string()))
        .with_metadata_url("http://127.0.0.1:1");
    let logging = logging.with_resource_detector(Arc::new(detector));

    let outcome = logging
        .log("pod")
        .unwrap()
        .info("started", WriteOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.written, 1);
    let requests = transport.write_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].resource.is_none());
    assert_eq!(transport.entries().len(), 1);
}

#[tokio::test]
async fn test_failed_detection_is_not_retried() {
    let (logging, transport) = test_client();
    let detector = Arc::new(BrokenDetector::default());
    let logging = logging.with_resource_detector(detector.clone());

    let log = logging.log("app").unwrap();
    log.info("one", WriteOptions::default()).await.unwrap();
    log.warning("two", WriteOptions::default()).await.unwrap();

    assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    assert!(transport
        .write_requests()
        .iter()
        .all(|request| request.resource.is_none()));
}

#[tokio::test]
async fn test_without_detector_resource_is_left_to_service() {
    let (logging, transport) = test_client();
    logging
        .log("app")
        .unwrap()
        .info("hi", WriteOptions::default())
        .await
        .unwrap();
    assert!(transport.write_requests()[0].resource.is_none());
}

#[tokio::test]
async fn test_list_logs() {
    let (logging, _transport) = test_client();
    seed(&logging, "b-log", 2).await;
    seed(&logging, "a-log", 1).await;

    let logs = logging.list_logs().await.unwrap();
    assert_eq!(
        logs,
        vec![
            format!("projects/{PROJECT}/logs/a-log"),
            format!("projects/{PROJECT}/logs/b-log"),
        ]
    );
}

#[tokio::test]
async fn test_rpc_errors_pass_through() {
    let (logging, transport) = test_client();
    transport.fail_next(tonic::Status::unavailable("backend down"));

    let err = logging
        .get_entries(GetEntriesOptions::default())
        .await
        .unwrap_err();
    match err {
        LoggingError::Rpc(status) => {
            assert_eq!(status.code(), tonic::Code::Unavailable);
            assert_eq!(status.message(), "backend down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_entry_helper() {
    let (logging, _transport) = test_client();
    let entry = logging.entry(None, "standalone");
    assert!(entry.metadata.resource.is_none());
    assert!(entry.metadata.timestamp.is_some());
    assert_eq!(logging.project_id(), PROJECT);
}
