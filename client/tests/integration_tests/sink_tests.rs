//! Integration tests for sink management.
//!
//! Tests cover:
//! - Creating sinks for each destination kind
//! - Reading, updating and deleting sinks
//! - Listing sinks with and without pagination

use cloud_logging::{
    Destination, GetSinksOptions, LoggingError, OutputVersionFormat, SinkMetadata, SinkUpdate,
};
use futures::TryStreamExt;

use super::common::test_client;

fn bucket(name: &str) -> SinkMetadata {
    SinkMetadata::new(Destination::Bucket(name.to_string()))
}

#[tokio::test]
async fn test_create_sink_for_each_destination() {
    let (logging, _transport) = test_client();

    let gcs = logging
        .create_sink("to-gcs", bucket("archive").with_filter("severity>=ERROR"))
        .await
        .unwrap();
    let bq = logging
        .create_sink(
            "to-bq",
            SinkMetadata::new(Destination::Dataset {
                project: "analytics".to_string(),
                dataset: "logs".to_string(),
            }),
        )
        .await
        .unwrap();
    let pubsub = logging
        .create_sink(
            "to-pubsub",
            SinkMetadata::new(Destination::Topic {
                project: "events".to_string(),
                topic: "log-stream".to_string(),
            }),
        )
        .await
        .unwrap();

    assert_eq!(gcs.formatted_name(), "projects/test-project/sinks/to-gcs");
    let gcs = gcs.metadata().unwrap();
    assert_eq!(gcs.destination, "storage.googleapis.com/archive");
    assert_eq!(gcs.filter.as_deref(), Some("severity>=ERROR"));
    assert!(gcs.writer_identity.is_some());
    assert_eq!(
        bq.metadata().unwrap().destination,
        "bigquery.googleapis.com/projects/analytics/datasets/logs"
    );
    assert_eq!(
        pubsub.metadata().unwrap().destination,
        "pubsub.googleapis.com/projects/events/topics/log-stream"
    );
}

#[tokio::test]
async fn test_create_duplicate_sink_fails() {
    let (logging, _transport) = test_client();
    logging.create_sink("dup", bucket("b")).await.unwrap();

    let err = logging.create_sink("dup", bucket("b")).await.unwrap_err();
    assert!(matches!(err, LoggingError::Rpc(status) if status.code() == tonic::Code::AlreadyExists));
}

#[tokio::test]
async fn test_create_sink_requires_name() {
    let (logging, _transport) = test_client();
    let err = logging.create_sink("", bucket("b")).await.unwrap_err();
    assert!(matches!(err, LoggingError::InvalidArgument(ref msg) if msg == "A sink name must be provided."));
}

#[tokio::test]
async fn test_sink_lifecycle_through_handle() {
    let (logging, _transport) = test_client();
    let mut sink = logging.sink("audit").unwrap();
    assert!(sink.metadata().is_none());

    sink.create(bucket("audit-logs")).await.unwrap();

    let mut other = logging.sink("audit").unwrap();
    let fetched = other.get_metadata().await.unwrap();
    assert_eq!(fetched.destination, "storage.googleapis.com/audit-logs");
    assert_eq!(fetched.filter, None);

    sink.set_filter(r#"logName="projects/test-project/logs/audit""#)
        .await
        .unwrap();
    let updated = sink
        .set_metadata(
            SinkUpdate::from(Destination::Bucket("audit-logs-v2".to_string()))
                .with_output_version_format(OutputVersionFormat::V2),
        )
        .await
        .unwrap();
    assert_eq!(updated.destination, "storage.googleapis.com/audit-logs-v2");
    assert_eq!(
        updated.filter.as_deref(),
        Some(r#"logName="projects/test-project/logs/audit""#)
    );
    assert_eq!(updated.output_version_format, OutputVersionFormat::V2);

    sink.delete().await.unwrap();
    let err = other.get_metadata().await.unwrap_err();
    assert!(matches!(err, LoggingError::Rpc(status) if status.code() == tonic::Code::NotFound));
}

#[tokio::test]
async fn test_partial_update_preserves_other_fields() {
    let (logging, _transport) = test_client();
    let mut sink = logging
        .create_sink(
            "quiet",
            SinkMetadata {
                disabled: true,
                include_children: true,
                ..bucket("quiet-logs").with_description("paused export")
            },
        )
        .await
        .unwrap();

    sink.set_metadata(SinkUpdate::new().with_filter("severity>=WARNING"))
        .await
        .unwrap();
    sink.set_metadata(SinkUpdate::from(Destination::Bucket("moved".to_string())))
        .await
        .unwrap();

    let stored = logging.sink("quiet").unwrap().get_metadata().await.unwrap().clone();
    assert_eq!(stored.destination, "storage.googleapis.com/moved");
    assert_eq!(stored.filter.as_deref(), Some("severity>=WARNING"));
    assert_eq!(stored.description.as_deref(), Some("paused export"));
    assert!(stored.disabled);
    assert!(stored.include_children);
}

#[tokio::test]
async fn test_get_sinks_auto_paginates() {
    let (logging, _transport) = test_client();
    for i in 0..5 {
        logging
            .create_sink(&format!("sink-{i}"), bucket("b"))
            .await
            .unwrap();
    }

    let page = logging
        .get_sinks(GetSinksOptions {
            page_size: Some(2),
            ..GetSinksOptions::default()
        })
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["sink-0", "sink-1", "sink-2", "sink-3", "sink-4"]);
    assert!(page.next_page_token.is_none());
    assert!(page.items.iter().all(|s| s.metadata().is_some()));
}

#[tokio::test]
async fn test_get_sinks_single_page() {
    let (logging, _transport) = test_client();
    for i in 0..3 {
        logging
            .create_sink(&format!("sink-{i}"), bucket("b"))
            .await
            .unwrap();
    }

    let first = logging
        .get_sinks(GetSinksOptions {
            page_size: Some(2),
            auto_paginate: false,
            ..GetSinksOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    let token = first.next_page_token.unwrap();

    let second = logging
        .get_sinks(GetSinksOptions {
            page_size: Some(2),
            page_token: Some(token),
            auto_paginate: false,
            ..GetSinksOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].name(), "sink-2");
    assert!(second.next_page_token.is_none());
}

#[tokio::test]
async fn test_get_sinks_single_page_sized_by_max_results() {
    let (logging, _transport) = test_client();
    for i in 0..3 {
        logging
            .create_sink(&format!("sink-{i}"), bucket("b"))
            .await
            .unwrap();
    }

    let first = logging
        .get_sinks(GetSinksOptions {
            max_results: Some(2),
            auto_paginate: false,
            ..GetSinksOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);

    let rest = logging
        .get_sinks(GetSinksOptions {
            page_token: first.next_page_token,
            auto_paginate: false,
            ..GetSinksOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].name(), "sink-2");
}

#[tokio::test]
async fn test_get_sinks_stream_with_limit() {
    let (logging, _transport) = test_client();
    for i in 0..4 {
        logging
            .create_sink(&format!("sink-{i}"), bucket("b"))
            .await
            .unwrap();
    }

    let sinks: Vec<_> = logging
        .get_sinks_stream(GetSinksOptions {
            page_size: Some(1),
            max_results: Some(3),
            ..GetSinksOptions::default()
        })
        .try_collect()
        .await
        .unwrap();
    assert_eq!(sinks.len(), 3);
}
