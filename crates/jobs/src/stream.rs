//! The job's client-facing WebSocket stream (C7): the `ready`/`cancel`
//! handshake, 30-second keep-alive, and forwarding of the job singleton's
//! outbound messages (§4.7, §6). The actor never touches job state
//! directly — it only relays [`ClientMessage`]s into [`JobHandle`]
//! operations and [`StreamMessage`]s back out to the socket.

use crate::job::JobHandle;
use crate::messages::{ClientMessage, StreamMessage, StreamPayload};
use actix::{Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// 30-second keep-alive (§4.7 `ping`/`pong`).
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Message)]
#[rtype(result = "()")]
struct Outbound(StreamMessage);

pub struct JobStreamActor {
    handle: Arc<JobHandle>,
    hb: Instant,
    receiver: Option<mpsc::UnboundedReceiver<StreamMessage>>,
}

impl JobStreamActor {
    pub fn new(handle: Arc<JobHandle>, receiver: mpsc::UnboundedReceiver<StreamMessage>) -> Self {
        Self { handle, hb: Instant::now(), receiver: Some(receiver) }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.hb) > CLIENT_TIMEOUT {
                ctx.close(Some(ws::CloseReason { code: ws::CloseCode::Away, description: None }));
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn start_forwarding(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(mut receiver) = self.receiver.take() {
            let addr = ctx.address();
            actix::spawn(async move {
                while let Some(message) = receiver.recv().await {
                    if addr.try_send(Outbound(message)).is_err() {
                        break;
                    }
                }
            });
        }
    }
}

impl Actor for JobStreamActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);
        self.start_forwarding(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.handle.signal_disconnected();
    }
}

impl Handler<Outbound> for JobStreamActor {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        if let Ok(json) = serde_json::to_string(&msg.0) {
            ctx.text(json);
        }

        if let Some(code) = terminal_close_code(&msg.0.payload) {
            ctx.close(Some(ws::CloseReason { code, description: None }));
            ctx.stop();
        }
    }
}

/// The close code to use once a terminal message has been forwarded
/// (§4.7, §6 S-5): `job_complete` always closes normally; a cancellation's
/// final `job_progress` (its `status` names the cancellation, by the
/// worker-side convention in `scan.rs`/`csv_import.rs`) also closes
/// normally; an `error`'s code maps to the matching RFC 6455 code, falling
/// back to 1011 (server error) for anything not named in §6.
fn terminal_close_code(payload: &StreamPayload) -> Option<ws::CloseCode> {
    match payload {
        StreamPayload::JobComplete { .. } => Some(ws::CloseCode::Normal),
        StreamPayload::JobProgress { status, .. } if status.contains("cancel") => Some(ws::CloseCode::Normal),
        StreamPayload::Error { code, .. } => Some(match code.as_str() {
            "UNAUTHORIZED" | "INVALID_TOKEN" | "TOKEN_EXPIRED" => ws::CloseCode::Policy,
            "FILE_TOO_LARGE" | "BATCH_TOO_LARGE" => ws::CloseCode::Size,
            "RATE_LIMIT_EXCEEDED" | "PROVIDER_UNAVAILABLE" => ws::CloseCode::Again,
            _ => ws::CloseCode::Error,
        }),
        StreamPayload::JobStarted { .. } | StreamPayload::JobProgress { .. } | StreamPayload::Ping | StreamPayload::Pong => None,
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for JobStreamActor {
    fn handle(&mut self, item: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match item {
            Ok(ws::Message::Ping(bytes)) => {
                self.hb = Instant::now();
                ctx.pong(&bytes);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ready) => self.handle.signal_ready(),
                    Ok(ClientMessage::Cancel) => self.handle.request_cancel(),
                    Ok(ClientMessage::Ping) => ctx.pong(b""),
                    Ok(ClientMessage::Pong) => {}
                    Err(e) => tracing::warn!(error = %e, "failed to parse client stream message"),
                }
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) | Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                tracing::error!(error = %e, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_gateway_core::types::Pipeline;

    #[tokio::test]
    async fn disconnect_signal_marks_the_handle_disconnected() {
        let handle = JobHandle::new(Pipeline::AiScan);
        handle.signal_disconnected();
        let outcome = handle.wait_for_ready(Duration::from_millis(10)).await;
        assert!(outcome.disconnected);
    }

    #[test]
    fn job_complete_closes_normally() {
        let payload = StreamPayload::JobComplete {
            total_detected: None,
            books_count: Some(1),
            approved: None,
            needs_review: None,
            results_url: "/v1/csv/results/abc".to_string(),
            metadata: None,
        };
        assert_eq!(terminal_close_code(&payload), Some(ws::CloseCode::Normal));
    }

    #[test]
    fn ordinary_progress_does_not_close_the_stream() {
        let payload = StreamPayload::JobProgress { progress: 0.5, status: "importing".to_string(), processed_count: None, current_item: None };
        assert_eq!(terminal_close_code(&payload), None);
    }

    #[test]
    fn cancellation_progress_closes_normally() {
        let payload = StreamPayload::JobProgress { progress: 0.3, status: "canceled by client".to_string(), processed_count: None, current_item: None };
        assert_eq!(terminal_close_code(&payload), Some(ws::CloseCode::Normal));
    }

    #[test]
    fn auth_error_maps_to_policy_violation_close_code() {
        let payload = StreamPayload::Error { code: "UNAUTHORIZED".to_string(), message: "nope".to_string(), retryable: false, details: None };
        assert_eq!(terminal_close_code(&payload), Some(ws::CloseCode::Policy));
    }

    #[test]
    fn unrecognized_error_code_falls_back_to_server_error_close_code() {
        let payload = StreamPayload::Error { code: "PROCESSING_FAILED".to_string(), message: "boom".to_string(), retryable: false, details: None };
        assert_eq!(terminal_close_code(&payload), Some(ws::CloseCode::Error));
    }
}
