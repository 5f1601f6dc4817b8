//! Bookshelf-scan pipeline (§4.6 C1/C6, §6 S-4): upload a shelf photo,
//! detect candidate spines, resolve each against the aggregation engine,
//! partition by the confidence threshold.

use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use biblio_gateway_aggregation::engine::ResolveQuery;
use biblio_gateway_aggregation::enrichment::{enrich_all, EnrichedItem};
use biblio_gateway_core::envelope::Envelope;
use biblio_gateway_core::models::detected_book::DetectedBook;
use biblio_gateway_core::types::Pipeline;
use biblio_gateway_core::{validation, GatewayError};
use futures_util::StreamExt;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];
const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Serialize)]
struct ScanAccepted {
    #[serde(rename = "jobId")]
    job_id: Uuid,
    token: String,
}

pub async fn submit_scan(state: web::Data<AppState>, mut payload: Multipart) -> Result<HttpResponse, GatewayError> {
    let mut image_bytes = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| GatewayError::InvalidContent(e.to_string()))?;
        let content_type = field.content_type().map(|ct| ct.to_string()).unwrap_or_default();
        validation::validate_content_type(&content_type, ALLOWED_CONTENT_TYPES)?;

        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| GatewayError::InvalidContent(e.to_string()))?;
            image_bytes.extend_from_slice(&data);
            validation::validate_file_size(image_bytes.len(), MAX_IMAGE_BYTES)?;
        }
    }

    if image_bytes.is_empty() {
        return Err(GatewayError::InvalidContent("no image data received".to_string()));
    }

    let handle = state.jobs.create(Pipeline::AiScan).await;
    let job_id = handle.id().await;
    let token = handle.stream_token().await;

    let state = state.clone();
    tokio::spawn(async move {
        run_scan(state, handle, job_id, image_bytes).await;
    });

    Ok(HttpResponse::Accepted().json(Envelope::success(ScanAccepted { job_id, token })))
}

async fn run_scan(state: web::Data<AppState>, handle: std::sync::Arc<biblio_gateway_jobs::JobHandle>, job_id: Uuid, image_bytes: Vec<u8>) {
    handle.wait_for_ready(Duration::from_secs(5)).await;

    let detections = match state.vision.detect_books_in_image(image_bytes).await {
        Ok(d) => d,
        Err(e) => {
            handle.send_error("PROCESSING_FAILED", e.to_string(), true, None).await;
            return;
        }
    };

    let total = detections.len() as u32;
    handle.emit_started(total, None).await;
    handle.initialize(total).await;

    let threshold = state.config.aggregation.detection_confidence_threshold;
    let concurrency = state.config.aggregation.enrichment_concurrency;
    let mut books = Vec::with_capacity(detections.len());
    let mut approved = 0u32;
    let mut needs_review = 0u32;
    let mut processed = 0u32;

    for chunk in detections.chunks(concurrency.max(1)) {
        if handle.is_canceled() {
            handle.cancel(processed as f32 / total.max(1) as f32, "canceled").await;
            return;
        }

        for detection in chunk {
            if detection.is_above_threshold(threshold) {
                approved += 1;
            } else {
                needs_review += 1;
            }
        }

        let state_for_batch = state.clone();
        let chunk_results = enrich_all(
            chunk.to_vec(),
            move |detection: DetectedBook| {
                let state = state_for_batch.clone();
                async move { Ok::<serde_json::Value, String>(resolve_detection(&state, detection).await) }
            },
            |_, _, _, _| {},
            concurrency,
        )
        .await;

        for outcome in chunk_results {
            processed += 1;
            match outcome {
                EnrichedItem::Enriched(value) => books.push(value),
                EnrichedItem::Failed { .. } => unreachable!("resolve_detection reports failures in its own payload, never via Err"),
            }
        }

        handle
            .update_progress(processed as f32 / total.max(1) as f32, "enriching", Some(processed), None)
            .await;
    }

    let results_url = format!("/v1/scan/results/{job_id}");
    let payload = serde_json::json!({ "jobId": job_id, "books": books });

    if let Err(e) = state.results.write(Pipeline::AiScan, job_id, &payload).await {
        handle.send_error("PROCESSING_FAILED", e.to_string(), false, None).await;
        return;
    }

    handle
        .complete(biblio_gateway_jobs::StreamPayload::JobComplete {
            total_detected: Some(total),
            books_count: None,
            approved: Some(approved),
            needs_review: Some(needs_review),
            results_url,
            metadata: None,
        })
        .await;
}

/// Resolves a single detection against the aggregation engine, using
/// whichever guess the vision model supplied (ISBN preferred, then title +
/// author) and attaching the outcome's `enrichmentStatus` (§6 S-4: one of
/// `success`, `not_found`, `error`).
async fn resolve_detection(state: &AppState, detection: DetectedBook) -> serde_json::Value {
    let result = if let Some(isbn) = detection.isbn_guess.as_deref() {
        state.engine.resolve_one(ResolveQuery { title: None, author: None, isbn: Some(isbn) }).await
    } else {
        state
            .engine
            .resolve_one(ResolveQuery {
                title: detection.title_guess.as_deref(),
                author: detection.author_guess.as_deref(),
                isbn: None,
            })
            .await
    };

    let (status, work, editions, authors) = match result {
        Ok(Some(resolved)) => ("success", Some(resolved.work), resolved.editions, resolved.authors),
        Ok(None) => ("not_found", None, Vec::new(), Vec::new()),
        Err(e) => {
            tracing::warn!(error = %e, "scan detection resolution failed");
            ("error", None, Vec::new(), Vec::new())
        }
    };

    serde_json::json!({
        "titleGuess": detection.title_guess,
        "authorGuess": detection.author_guess,
        "isbnGuess": detection.isbn_guess,
        "confidence": detection.confidence,
        "boundingBox": detection.bounding_box,
        "enrichmentStatus": status,
        "work": work,
        "editions": editions,
        "authors": authors,
    })
}

pub async fn get_scan_results(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, GatewayError> {
    let job_id = path.into_inner();
    match state
        .results
        .read(Pipeline::AiScan, job_id)
        .await
        .map_err(|e| GatewayError::InternalError(anyhow::anyhow!(e)))?
    {
        Some(payload) => Ok(HttpResponse::Ok().json(Envelope::success(payload))),
        None => Err(GatewayError::JobNotFound { job_id: job_id.to_string() }),
    }
}
