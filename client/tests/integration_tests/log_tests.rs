//! Integration tests for the log handle.
//!
//! Tests cover:
//! - Writing text and JSON entries and reading them back
//! - Severity helpers
//! - Reads scoped to one log
//! - Deleting a log

use cloud_logging::{
    Entry, EntryMetadata, GetEntriesOptions, HttpRequest, LoggingError, MonitoredResource,
    Payload, Severity, WriteOptions,
};
use futures::TryStreamExt;
use serde_json::json;
use std::time::Duration;

use super::common::{at, test_client, text_entry, PROJECT};

#[tokio::test]
async fn test_write_and_read_back_json_entry() {
    let (logging, _transport) = test_client();
    let log = logging.log("checkout").unwrap();

    let metadata = EntryMetadata::new()
        .with_severity(Severity::Warning)
        .with_timestamp(at(10))
        .with_label("region", "eu")
        .with_http_request(
            HttpRequest::new("POST", "https://shop.example.com/cart", 503)
                .with_latency(Duration::from_millis(1500)),
        );
    let entry = log.entry(
        metadata,
        json!({"message": "payment gateway timeout", "attempt": 3, "ok": false}),
    );
    log.write(entry, WriteOptions::default()).await.unwrap();

    let page = log.get_entries(GetEntriesOptions::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);

    let read = &page.items[0];
    assert_eq!(read.metadata.severity, Some(Severity::Warning));
    assert_eq!(read.metadata.timestamp, Some(at(10)));
    assert_eq!(read.metadata.labels["region"], "eu");
    assert_eq!(
        read.metadata.log_name.as_deref(),
        Some(format!("projects/{PROJECT}/logs/checkout").as_str())
    );
    let http = read.metadata.http_request.as_ref().unwrap();
    assert_eq!(http.status, 503);
    assert_eq!(http.latency, Some(Duration::from_millis(1500)));
    assert_eq!(
        read.data,
        Payload::Json(json!({"message": "payment gateway timeout", "attempt": 3, "ok": false}))
    );
}

#[tokio::test]
async fn test_severity_helpers() {
    let (logging, transport) = test_client();
    let log = logging.log("app").unwrap();
    let options = WriteOptions::default;

    log.alert("a", options()).await.unwrap();
    log.critical("c", options()).await.unwrap();
    log.debug("d", options()).await.unwrap();
    log.emergency("em", options()).await.unwrap();
    log.error("er", options()).await.unwrap();
    log.info("i", options()).await.unwrap();
    log.notice("n", options()).await.unwrap();
    log.warning("w", options()).await.unwrap();

    let severities: Vec<i32> = transport.entries().iter().map(|e| e.severity).collect();
    assert_eq!(severities, vec![700, 600, 100, 800, 500, 200, 300, 400]);
}

#[tokio::test]
async fn test_severity_helper_overrides_entry_severity() {
    let (logging, transport) = test_client();
    let log = logging.log("app").unwrap();

    log.error(text_entry("boom", Severity::Debug, 1), WriteOptions::default())
        .await
        .unwrap();
    assert_eq!(transport.entries()[0].severity, 500);
}

#[tokio::test]
async fn test_reads_are_scoped_to_the_log() {
    let (logging, _transport) = test_client();
    let web = logging.log("web").unwrap();
    let worker = logging.log("worker").unwrap();

    web.write(
        vec![
            text_entry("GET /", Severity::Info, 1),
            text_entry("GET /admin", Severity::Error, 2),
        ],
        WriteOptions::default(),
    )
    .await
    .unwrap();
    worker
        .write(text_entry("job done", Severity::Error, 3), WriteOptions::default())
        .await
        .unwrap();

    let page = web.get_entries(GetEntriesOptions::default()).await.unwrap();
    let texts: Vec<String> = page.items.iter().map(Entry::payload_text).collect();
    assert_eq!(texts, vec!["GET /admin", "GET /"]);

    let errors = web
        .get_entries(GetEntriesOptions::default().with_filter("severity>=ERROR"))
        .await
        .unwrap();
    assert_eq!(errors.items.len(), 1);
    assert_eq!(errors.items[0].payload_text(), "GET /admin");

    let all = logging.get_entries(GetEntriesOptions::default()).await.unwrap();
    assert_eq!(all.items.len(), 3);
}

#[tokio::test]
async fn test_stream_entries_of_log() {
    let (logging, _transport) = test_client();
    let log = logging.log("batch").unwrap();
    let entries: Vec<Entry> = (0..5)
        .map(|i| text_entry(&format!("line {i}"), Severity::Info, i))
        .collect();
    log.write(entries, WriteOptions::default()).await.unwrap();

    let streamed: Vec<Entry> = log
        .get_entries_stream(
            GetEntriesOptions::default()
                .with_order_by("timestamp asc")
                .with_page_size(2),
        )
        .try_collect()
        .await
        .unwrap();
    let texts: Vec<String> = streamed.iter().map(Entry::payload_text).collect();
    assert_eq!(texts, vec!["line 0", "line 1", "line 2", "line 3", "line 4"]);
}

#[tokio::test]
async fn test_write_uses_given_resource() {
    let (logging, transport) = test_client();
    let log = logging.log("app").unwrap();

    log.info(
        "hello",
        WriteOptions::default().with_resource(
            MonitoredResource::new("gce_instance")
                .with_label("instanceId", "1234")
                .with_label("zone", "us-central1-a"),
        ),
    )
    .await
    .unwrap();

    let resource = transport.entries()[0].resource.clone().unwrap();
    assert_eq!(resource.r#type, "gce_instance");
    assert_eq!(resource.labels["instance_id"], "1234");
    assert_eq!(resource.labels["zone"], "us-central1-a");
}

#[tokio::test]
async fn test_unserializable_entries_are_dropped() {
    let (logging, transport) = test_client();
    let log = logging.log("app").unwrap();

    let outcome = log
        .write(
            vec![
                Entry::new(json!(42)),
                Entry::new("kept"),
                Entry::new(json!(true)),
            ],
            WriteOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.written, 1);
    assert_eq!(outcome.dropped, 2);
    assert_eq!(transport.entries().len(), 1);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let (logging, transport) = test_client();
    let log = logging.log("app").unwrap();

    let options = WriteOptions {
        dry_run: true,
        ..WriteOptions::default()
    };
    log.info("not stored", options).await.unwrap();

    assert!(transport.entries().is_empty());
    assert!(transport.write_requests()[0].dry_run);
}

#[tokio::test]
async fn test_delete_log() {
    let (logging, _transport) = test_client();
    let log = logging.log("temp").unwrap();
    log.info("bye", WriteOptions::default()).await.unwrap();

    log.delete().await.unwrap();
    assert!(log
        .get_entries(GetEntriesOptions::default())
        .await
        .unwrap()
        .items
        .is_empty());

    let err = log.delete().await.unwrap_err();
    assert!(matches!(err, LoggingError::Rpc(status) if status.code() == tonic::Code::NotFound));
}
