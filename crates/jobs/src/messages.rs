//! The job stream's wire message envelope (§6): every server→client
//! message shares one shape, discriminated by `type`.

use biblio_gateway_core::types::Pipeline;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PROTOCOL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamPayload {
    JobStarted { total_count: u32, #[serde(skip_serializing_if = "Option::is_none")] estimated_duration: Option<f64> },
    JobProgress {
        progress: f32,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        processed_count: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_item: Option<String>,
    },
    JobComplete {
        #[serde(skip_serializing_if = "Option::is_none")]
        total_detected: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        books_count: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        approved: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        needs_review: Option<u32>,
        results_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    Error { code: String, message: String, retryable: bool, #[serde(skip_serializing_if = "Option::is_none")] details: Option<serde_json::Value> },
    Ping,
    Pong,
}

/// The envelope wrapping every message sent over a job's stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    pub job_id: Uuid,
    pub pipeline: Pipeline,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    #[serde(flatten)]
    pub payload: StreamPayload,
}

impl StreamMessage {
    pub fn new(job_id: Uuid, pipeline: Pipeline, payload: StreamPayload) -> Self {
        Self { job_id, pipeline, timestamp: chrono::Utc::now(), version: PROTOCOL_VERSION.to_string(), payload }
    }
}

/// Client→server control messages understood on the stream (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ready,
    Cancel,
    Ping,
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_message_carries_the_fixed_protocol_version() {
        let msg = StreamMessage::new(
            Uuid::new_v4(),
            Pipeline::AiScan,
            StreamPayload::JobStarted { total_count: 3, estimated_duration: None },
        );
        assert_eq!(msg.version, "1.0.0");
    }

    #[test]
    fn client_ready_round_trips_through_json() {
        let json = serde_json::to_string(&ClientMessage::Ready).unwrap();
        let parsed: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ClientMessage::Ready));
    }
}
