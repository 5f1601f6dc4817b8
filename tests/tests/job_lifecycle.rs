//! Job singleton + progress stream ordering (§4.7, §5, §8) and
//! cancellation mid-batch (§6 S-5), exercised against the public
//! `biblio-gateway-jobs` and `biblio-gateway-aggregation` APIs.

use biblio_gateway_aggregation::enrichment::{enrich_all, EnrichedItem};
use biblio_gateway_core::types::{JobState, Pipeline};
use biblio_gateway_jobs::{JobRegistry, StreamPayload};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// `job_started` precedes any `job_progress`, and exactly one of
/// `job_complete` / `error` is the last message before close (§5, §8).
#[tokio::test]
async fn message_order_is_started_then_progress_then_exactly_one_terminal_message() {
    let registry = JobRegistry::new();
    let handle = registry.create(Pipeline::BatchEnrichment).await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    handle.attach_stream(tx).await;

    handle.initialize(3).await;
    handle.emit_started(3, None).await;
    handle.update_progress(0.33, "working", Some(1), None).await;
    handle.update_progress(0.66, "working", Some(2), None).await;
    handle
        .complete(StreamPayload::JobComplete {
            total_detected: None,
            books_count: Some(3),
            approved: None,
            needs_review: None,
            results_url: "/v1/enrichment/results/abc".to_string(),
            metadata: None,
        })
        .await;

    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }

    assert!(matches!(messages[0].payload, StreamPayload::JobStarted { .. }));
    assert!(matches!(messages[1].payload, StreamPayload::JobProgress { .. }));
    assert!(matches!(messages[2].payload, StreamPayload::JobProgress { .. }));
    assert!(matches!(messages.last().unwrap().payload, StreamPayload::JobComplete { .. }));
    assert_eq!(
        messages.iter().filter(|m| matches!(m.payload, StreamPayload::JobComplete { .. } | StreamPayload::Error { .. })).count(),
        1,
        "exactly one terminal message must be emitted"
    );
    assert_eq!(handle.state().await, JobState::Complete);
}

/// Successive `job_progress` calls describing the same numeric progress
/// need not be re-sent (§4.7 throttling).
#[tokio::test]
async fn identical_successive_progress_values_are_throttled() {
    let handle = biblio_gateway_jobs::JobHandle::new(Pipeline::CsvImport);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    handle.attach_stream(tx).await;

    handle.update_progress(0.5, "working", Some(5), None).await;
    handle.update_progress(0.5, "still working", Some(5), None).await;
    handle.update_progress(0.75, "working", Some(7), None).await;

    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    assert_eq!(count, 2, "the repeated 0.5 progress must not be sent twice");
}

/// §6 S-5 / §8: cancellation observed between batch k and k+1 yields
/// exactly k*concurrency processed items, and the job singleton ends in
/// `canceled` with one terminal progress message.
#[tokio::test]
async fn cancellation_between_batches_stops_at_the_batch_boundary() {
    let registry = JobRegistry::new();
    let handle = registry.create(Pipeline::BatchEnrichment).await;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    handle.attach_stream(tx).await;
    handle.initialize(100).await;
    handle.emit_started(100, None).await;

    let concurrency = 10usize;
    let total = 100usize;
    let items: Vec<usize> = (0..total).collect();
    let processed = Arc::new(AtomicUsize::new(0));
    let cancel_after_batch_3 = Arc::new(AtomicBool::new(false));

    let mut results = Vec::with_capacity(total);
    for (batch_index, batch) in items.chunks(concurrency).enumerate() {
        if handle.is_canceled() {
            break;
        }
        let batch_results = enrich_all(
            batch.to_vec(),
            |item: usize| async move { Ok::<usize, String>(item) },
            |_, _, _, _| {},
            concurrency,
        )
        .await;
        processed.fetch_add(batch_results.len(), Ordering::SeqCst);
        results.extend(batch_results);

        if batch_index == 2 {
            // Client cancels right after batch 3 (30 items) completes.
            handle.request_cancel();
            cancel_after_batch_3.store(true, Ordering::SeqCst);
        }
    }

    assert!(cancel_after_batch_3.load(Ordering::SeqCst));
    assert_eq!(processed.load(Ordering::SeqCst), 3 * concurrency);
    assert_eq!(results.len(), 3 * concurrency);

    let completed_count = results.iter().filter(|r| matches!(r, EnrichedItem::Enriched(_))).count() as u32;
    handle.cancel(completed_count as f32 / total as f32, "canceled by client").await;

    assert_eq!(handle.state().await, JobState::Canceled);

    let mut terminal_messages = 0;
    while let Ok(msg) = rx.try_recv() {
        if let StreamPayload::JobProgress { .. } = msg.payload {
            terminal_messages += 1;
        }
    }
    assert!(terminal_messages >= 1);
}

/// Jobs are independently tracked by the registry; removing one does not
/// disturb another (§3 lifecycle).
#[tokio::test]
async fn registry_tracks_jobs_independently() {
    let registry = JobRegistry::new();
    let a = registry.create(Pipeline::AiScan).await;
    let b = registry.create(Pipeline::CsvImport).await;

    let a_id = a.id().await;
    let b_id = b.id().await;
    registry.remove(a_id);

    assert!(registry.get(a_id).is_none());
    assert!(registry.get(b_id).is_some());
}
