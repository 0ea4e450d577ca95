//! Integration tests for paced batched bulk writes

mod common;

use armature_opensearch_batch::*;
use common::RecordingBulk;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn op(i: usize) -> Option<BulkOperation> {
    Some(BulkOperation::create("events", i.to_string(), json!({ "n": i })))
}

fn options(limit: usize) -> BulkOptions {
    BulkOptions::new()
        .batch_limit(limit)
        .inter_batch_delay(Duration::from_millis(100))
}

#[tokio::test(start_paused = true)]
async fn test_partition_into_batches() {
    let bulk = Arc::new(RecordingBulk::new());
    let writer = BatchedBulkWriter::new(bulk.clone());

    let outcome = writer.run(2500, &options(1000), op).await.unwrap();

    let sizes: Vec<_> = bulk.calls().iter().map(|c| c.ids.len()).collect();
    assert_eq!(sizes, [1000, 1000, 500]);
    assert_eq!(outcome.succeeded, 2500);
    assert_eq!(outcome.batches_sent, 3);
    assert!(outcome.is_clean());
}

#[tokio::test(start_paused = true)]
async fn test_exact_division_has_no_extra_batch() {
    let bulk = Arc::new(RecordingBulk::new());
    let mut calls = 0;

    let outcome = BatchedBulkWriter::new(bulk.clone())
        .run(2000, &options(1000), |i| {
            calls += 1;
            op(i)
        })
        .await
        .unwrap();

    assert_eq!(calls, 2000);
    assert_eq!(outcome.batches_sent, 2);
}

#[tokio::test(start_paused = true)]
async fn test_factory_called_once_per_position_in_order() {
    let bulk = RecordingBulk::new();
    let mut seen = Vec::new();

    BatchedBulkWriter::new(&bulk)
        .run(7, &options(3), |i| {
            seen.push(i);
            if i % 2 == 0 { op(i) } else { None }
        })
        .await
        .unwrap();

    assert_eq!(seen, (0..7).collect::<Vec<_>>());
    let ids: Vec<_> = bulk.calls().into_iter().map(|c| c.ids).collect();
    assert_eq!(ids, vec![vec!["0", "2"], vec!["4"], vec!["6"]]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_batch_is_never_sent() {
    let bulk = Arc::new(RecordingBulk::new());

    let outcome = BatchedBulkWriter::new(bulk.clone())
        .run(2500, &options(1000), |i| if (1000..2000).contains(&i) { None } else { op(i) })
        .await
        .unwrap();

    let sizes: Vec<_> = bulk.calls().iter().map(|c| c.ids.len()).collect();
    assert_eq!(sizes, [1000, 500]);
    assert_eq!(outcome.succeeded, 1500);
}

#[tokio::test(start_paused = true)]
async fn test_pacing_between_sent_batches() {
    let bulk = Arc::new(RecordingBulk::new());
    let start = tokio::time::Instant::now();

    BatchedBulkWriter::new(bulk.clone())
        .run(30, &options(10), op)
        .await
        .unwrap();

    let calls = bulk.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].at - start, Duration::ZERO);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(100));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_skipped_first_batch_keeps_next_batch_unthrottled() {
    let bulk = Arc::new(RecordingBulk::new());
    let start = tokio::time::Instant::now();

    BatchedBulkWriter::new(bulk.clone())
        .run(30, &options(10), |i| if i < 10 { None } else { op(i) })
        .await
        .unwrap();

    let calls = bulk.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].at - start, Duration::ZERO);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_skipped_middle_batch_adds_no_delay() {
    let bulk = Arc::new(RecordingBulk::new());

    BatchedBulkWriter::new(bulk.clone())
        .run(30, &options(10), |i| if (10..20).contains(&i) { None } else { op(i) })
        .await
        .unwrap();

    let calls = bulk.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_conflicts_suppressed() {
    let bulk = RecordingBulk::new()
        .item_error("3", 409, VERSION_CONFLICT)
        .item_error("5", 409, VERSION_CONFLICT)
        .item_error("8", 400, "mapper_parsing_exception");

    let outcome = BatchedBulkWriter::new(&bulk)
        .run(10, &options(10).ignore_version_conflicts(true), op)
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 10 - 3);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors.causes()[0].id, "8");
    assert_eq!(outcome.errors.causes()[0].error_type, "mapper_parsing_exception");
}

#[tokio::test(start_paused = true)]
async fn test_conflicts_reported_by_default() {
    let bulk = RecordingBulk::new().item_error("3", 409, VERSION_CONFLICT);

    let outcome = BatchedBulkWriter::new(&bulk).run(10, &options(4), op).await.unwrap();

    assert_eq!(outcome.succeeded, 9);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.clone().into_result().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_item_failures_do_not_stop_later_batches() {
    let bulk = RecordingBulk::new()
        .item_error("0", 400, "illegal_argument_exception")
        .item_error("25", 429, "es_rejected_execution_exception");

    let outcome = BatchedBulkWriter::new(&bulk).run(30, &options(10), op).await.unwrap();

    assert_eq!(bulk.calls().len(), 3);
    assert_eq!(outcome.succeeded, 28);
    let ids: Vec<_> = outcome.errors.causes().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["0", "25"]);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_aborts_run() {
    let bulk = RecordingBulk::new().failing_call(1);

    let err = BatchedBulkWriter::new(&bulk)
        .run(2500, &options(1000), op)
        .await
        .unwrap_err();

    assert!(matches!(err, OpenSearchError::Connection(_)));
    assert_eq!(bulk.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_passed_through() {
    let bulk = RecordingBulk::new();

    BatchedBulkWriter::new(&bulk)
        .run(3, &options(2).refresh(Refresh::WaitFor), op)
        .await
        .unwrap();

    assert!(bulk.calls().iter().all(|c| c.refresh == Refresh::WaitFor));
}

#[tokio::test]
async fn test_zero_total_does_nothing() {
    let bulk = RecordingBulk::new();
    let mut called = false;

    let outcome = BatchedBulkWriter::new(&bulk)
        .run(0, &BulkOptions::default(), |_| {
            called = true;
            None
        })
        .await
        .unwrap();

    assert_eq!(outcome, BulkOutcome::default());
    assert!(!called);
    assert!(bulk.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_limit_larger_than_total_is_clamped() {
    let bulk = RecordingBulk::new();

    let outcome = BatchedBulkWriter::new(&bulk)
        .run(5, &options(1000), op)
        .await
        .unwrap();

    assert_eq!(bulk.calls().len(), 1);
    assert_eq!(outcome.succeeded, 5);
}

#[tokio::test(start_paused = true)]
async fn test_retrying_wrapper_recovers_transport_error() {
    let bulk = RecordingBulk::new().failing_call(1);
    let retrying = Retrying::new(&bulk, RetryConfig::constant(3, Duration::from_millis(10)));

    let outcome = BatchedBulkWriter::new(retrying).run(30, &options(10), op).await.unwrap();

    assert_eq!(outcome.succeeded, 30);
    assert_eq!(outcome.batches_sent, 3);
    assert_eq!(bulk.calls().len(), 4);
}

// Requires a running cluster: cargo test -- --ignored
#[tokio::test]
#[ignore]
async fn test_bulk_against_cluster() {
    let client = OpenSearchClient::new(OpenSearchConfig::new("http://localhost:9200")).unwrap();

    let outcome = client
        .bulk_writer()
        .run(50, &BulkOptions::new().batch_limit(20).refresh(Refresh::WaitFor), |i| {
            Some(BulkOperation::index("bulk-writer-test", i.to_string(), json!({ "n": i })))
        })
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 50);
    client.refresh("bulk-writer-test").await.unwrap();
}
