//! Batch work enrichment (§4.6 C6, §6): submit a set of work identifiers,
//! track progress over the job stream, fetch the full result set once
//! complete. The distilled interface list omits a batch-enrichment results
//! endpoint; §4.8 describes the results store as uniform across pipelines,
//! so this mirrors `/v1/scan/results` and `/v1/csv/results`.

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use biblio_gateway_aggregation::engine::ResolveQuery;
use biblio_gateway_aggregation::enrichment::{enrich_all, EnrichedItem};
use biblio_gateway_core::envelope::Envelope;
use biblio_gateway_core::types::Pipeline;
use biblio_gateway_core::{validation, GatewayError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct BatchEnrichmentRequest {
    /// Client-supplied correlation id, echoed nowhere else — the
    /// authoritative jobId is always minted by the job registry.
    #[serde(rename = "jobId")]
    #[allow(dead_code)]
    pub job_id: Option<String>,
    #[serde(rename = "workIds")]
    pub work_ids: Vec<String>,
}

#[derive(Serialize)]
struct BatchAccepted {
    #[serde(rename = "jobId")]
    job_id: Uuid,
    token: String,
}

pub async fn submit_batch(state: web::Data<AppState>, body: web::Json<BatchEnrichmentRequest>) -> Result<HttpResponse, GatewayError> {
    validation::validate_batch_size(body.work_ids.len())?;

    let handle = state.jobs.create(Pipeline::BatchEnrichment).await;
    let job_id = handle.id().await;
    let token = handle.stream_token().await;
    handle.initialize(body.work_ids.len() as u32).await;

    let work_ids = body.work_ids.clone();
    let state = state.clone();
    tokio::spawn(async move {
        run_batch_enrichment(state, handle, job_id, work_ids).await;
    });

    Ok(HttpResponse::Accepted().json(Envelope::success(BatchAccepted { job_id, token })))
}

async fn run_batch_enrichment(state: web::Data<AppState>, handle: std::sync::Arc<biblio_gateway_jobs::JobHandle>, job_id: Uuid, work_ids: Vec<String>) {
    let total = work_ids.len() as u32;
    handle.wait_for_ready(Duration::from_secs(5)).await;
    handle.emit_started(total, None).await;

    let concurrency = state.config.aggregation.enrichment_concurrency;
    let mut processed = 0u32;
    let mut results = Vec::with_capacity(work_ids.len());

    for chunk in work_ids.chunks(concurrency.max(1)) {
        if handle.is_canceled() {
            handle.cancel(processed as f32 / total.max(1) as f32, "canceled").await;
            return;
        }

        let engine = state.engine.clone();
        let chunk_results = enrich_all(
            chunk.to_vec(),
            move |work_id: String| {
                let engine = engine.clone();
                async move {
                    engine
                        .resolve_one(ResolveQuery { title: Some(work_id.as_str()), author: None, isbn: None })
                        .await
                        .map_err(|e| e.to_string())
                        .and_then(|opt| opt.ok_or_else(|| "not_found".to_string()))
                }
            },
            |_, _, _, _| {},
            concurrency,
        )
        .await;

        for outcome in chunk_results {
            processed += 1;
            match outcome {
                EnrichedItem::Enriched(resolved) => {
                    results.push(serde_json::json!({
                        "workId": resolved.work.title,
                        "status": "success",
                        "work": resolved.work,
                        "editions": resolved.editions,
                        "authors": resolved.authors,
                    }));
                }
                EnrichedItem::Failed { item, error } => {
                    let status = if error == "not_found" { "not_found" } else { "error" };
                    results.push(serde_json::json!({ "workId": item, "status": status, "error": error }));
                }
            }
        }

        handle
            .update_progress(processed as f32 / total.max(1) as f32, "enriching", Some(processed), None)
            .await;
    }

    let results_url = format!("/v1/enrichment/results/{job_id}");
    let payload = serde_json::json!({ "jobId": job_id, "results": results });

    if let Err(e) = state.results.write(Pipeline::BatchEnrichment, job_id, &payload).await {
        handle.send_error("PROCESSING_FAILED", e.to_string(), false, None).await;
        return;
    }

    handle
        .complete(biblio_gateway_jobs::StreamPayload::JobComplete {
            total_detected: None,
            books_count: Some(total),
            approved: None,
            needs_review: None,
            results_url,
            metadata: None,
        })
        .await;
}

pub async fn get_batch_results(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, GatewayError> {
    let job_id = path.into_inner();
    match state
        .results
        .read(Pipeline::BatchEnrichment, job_id)
        .await
        .map_err(|e| GatewayError::InternalError(anyhow::anyhow!(e)))?
    {
        Some(payload) => Ok(HttpResponse::Ok().json(Envelope::success(payload))),
        None => Err(GatewayError::JobNotFound { job_id: job_id.to_string() }),
    }
}
