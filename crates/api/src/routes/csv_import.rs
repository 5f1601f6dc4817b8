//! CSV catalog import (§4.6 C6, §6): a text/csv body with `title`,
//! `author`, and optional `isbn` columns, one row per candidate book.

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

#[derive(Debug, Clone, Deserialize)]
struct CsvRow {
    title: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    isbn: Option<String>,
}

#[derive(Serialize)]
struct CsvAccepted {
    #[serde(rename = "jobId")]
    job_id: Uuid,
    token: String,
}

pub async fn submit_csv_import(state: web::Data<AppState>, body: String) -> Result<HttpResponse, GatewayError> {
    let rows = parse_rows(&body)?;
    validation::validate_batch_size(rows.len())?;

    let handle = state.jobs.create(Pipeline::CsvImport).await;
    let job_id = handle.id().await;
    let token = handle.stream_token().await;
    handle.initialize(rows.len() as u32).await;

    let state = state.clone();
    tokio::spawn(async move {
        run_csv_import(state, handle, job_id, rows).await;
    });

    Ok(HttpResponse::Accepted().json(Envelope::success(CsvAccepted { job_id, token })))
}

fn parse_rows(body: &str) -> Result<Vec<CsvRow>, GatewayError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(body.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let row = record.map_err(|e| GatewayError::InvalidContent(format!("malformed CSV row: {e}")))?;
        rows.push(row);
    }
    Ok(rows)
}

async fn run_csv_import(state: web::Data<AppState>, handle: std::sync::Arc<biblio_gateway_jobs::JobHandle>, job_id: Uuid, rows: Vec<CsvRow>) {
    let total = rows.len() as u32;
    handle.wait_for_ready(Duration::from_secs(5)).await;
    handle.emit_started(total, None).await;

    let concurrency = state.config.aggregation.enrichment_concurrency;
    let mut processed = 0u32;
    let mut results = Vec::with_capacity(rows.len());

    for chunk in rows.chunks(concurrency.max(1)) {
        if handle.is_canceled() {
            handle.cancel(processed as f32 / total.max(1) as f32, "canceled").await;
            return;
        }

        let engine = state.engine.clone();
        let chunk_results = enrich_all(
            chunk.to_vec(),
            move |row: CsvRow| {
                let engine = engine.clone();
                async move {
                    let resolved = if let Some(isbn) = row.isbn.as_deref() {
                        engine.resolve_one(ResolveQuery { title: None, author: None, isbn: Some(isbn) }).await
                    } else {
                        engine
                            .resolve_one(ResolveQuery { title: Some(row.title.as_str()), author: row.author.as_deref(), isbn: None })
                            .await
                    };
                    resolved.map_err(|e| e.to_string()).and_then(|opt| opt.ok_or_else(|| "not_found".to_string()))
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
                        "status": "success",
                        "work": resolved.work,
                        "editions": resolved.editions,
                        "authors": resolved.authors,
                    }));
                }
                EnrichedItem::Failed { item, error } => {
                    let status = if error == "not_found" { "not_found" } else { "error" };
                    results.push(serde_json::json!({ "title": item.title, "status": status, "error": error }));
                }
            }
        }

        handle
            .update_progress(processed as f32 / total.max(1) as f32, "importing", Some(processed), None)
            .await;
    }

    let results_url = format!("/v1/csv/results/{job_id}");
    let payload = serde_json::json!({ "jobId": job_id, "results": results });

    if let Err(e) = state.results.write(Pipeline::CsvImport, job_id, &payload).await {
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

pub async fn get_csv_results(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, GatewayError> {
    let job_id = path.into_inner();
    match state
        .results
        .read(Pipeline::CsvImport, job_id)
        .await
        .map_err(|e| GatewayError::InternalError(anyhow::anyhow!(e)))?
    {
        Some(payload) => Ok(HttpResponse::Ok().json(Envelope::success(payload))),
        None => Err(GatewayError::JobNotFound { job_id: job_id.to_string() }),
    }
}
