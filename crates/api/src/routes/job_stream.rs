//! The job progress stream (§4.7, §6): `/v1/jobs/{jobId}/stream?token=...`.
//! Validates the single-use stream token, attaches the job singleton's
//! outbound channel, and upgrades to a WebSocket handled by
//! [`JobStreamActor`].

use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use biblio_gateway_core::GatewayError;
use biblio_gateway_jobs::JobStreamActor;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct StreamQuery {
    pub token: String,
}

pub async fn stream(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<StreamQuery>,
) -> Result<HttpResponse, GatewayError> {
    let job_id = path.into_inner();
    let handle = state.jobs.get(job_id).ok_or_else(|| GatewayError::JobNotFound { job_id: job_id.to_string() })?;

    if !handle.try_consume_stream_token(&query.token).await {
        return Err(GatewayError::InvalidToken);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    handle.attach_stream(tx).await;

    let actor = JobStreamActor::new(handle, rx);
    ws::start(actor, &req, stream).map_err(|e| GatewayError::InternalError(anyhow::anyhow!(e)))
}
