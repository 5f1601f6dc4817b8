//! The per-job singleton (C7): state, stage counters, the ready/cancel
//! signals, and the operations a worker drives the job through (§4.7).
//! Exactly one [`JobHandle`] exists per jobId; the worker never touches
//! the client stream directly, only these operations.

use crate::messages::{StreamMessage, StreamPayload};
use biblio_gateway_core::models::job::Job;
use biblio_gateway_core::types::{JobState, Pipeline};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Mutex, Notify};
use uuid::Uuid;

#[derive(Debug)]
pub struct WaitForReadyOutcome {
    pub ready: bool,
    pub timed_out: bool,
    pub disconnected: bool,
}

/// The per-job singleton. `initialize` is idempotent; everything else
/// assumes it has already been called.
pub struct JobHandle {
    job: Mutex<Job>,
    ready_notify: Notify,
    ready: AtomicBool,
    disconnected: AtomicBool,
    cancel_requested: AtomicBool,
    last_reported_progress: Mutex<Option<f32>>,
    sender: Mutex<Option<mpsc::UnboundedSender<StreamMessage>>>,
}

impl JobHandle {
    pub fn new(pipeline: Pipeline) -> Arc<Self> {
        Arc::new(Self {
            job: Mutex::new(Job::new(pipeline, 0, chrono::Utc::now())),
            ready_notify: Notify::new(),
            ready: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            last_reported_progress: Mutex::new(None),
            sender: Mutex::new(None),
        })
    }

    pub async fn id(&self) -> Uuid {
        self.job.lock().await.id
    }

    pub async fn stream_token(&self) -> String {
        self.job.lock().await.stream_token.token.clone()
    }

    /// Validate and consume the stream-open token presented by a client
    /// (§4.7). Succeeds at most once per issued token.
    pub async fn try_consume_stream_token(&self, token: &str) -> bool {
        let mut job = self.job.lock().await;
        if job.stream_token.token != token {
            return false;
        }
        job.stream_token.try_consume(chrono::Utc::now())
    }

    /// Bind the client stream handle. Called once the websocket actor for
    /// this jobId has started.
    pub async fn attach_stream(&self, sender: mpsc::UnboundedSender<StreamMessage>) {
        *self.sender.lock().await = Some(sender);
    }

    /// `initializeJobState(pipeline, totalStages)` — idempotent: a second
    /// call is a no-op once the job has left `pending`.
    pub async fn initialize(&self, total: u32) {
        let mut job = self.job.lock().await;
        if job.state == JobState::Pending && job.total == 0 {
            job.total = total;
        }
    }

    /// `ready` from the client: sets the ready signal, unblocking any
    /// in-flight [`Self::wait_for_ready`].
    pub fn signal_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        self.ready_notify.notify_waiters();
    }

    pub fn signal_disconnected(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        self.ready_notify.notify_waiters();
    }

    /// `cancel` from the client: sets cancel-requested without an
    /// immediate state transition (§4.7).
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Blocks until ready, timeout, or disconnect. Even on timeout the
    /// worker proceeds — the client may simply miss early progress.
    pub async fn wait_for_ready(&self, timeout: std::time::Duration) -> WaitForReadyOutcome {
        if self.ready.load(Ordering::SeqCst) {
            return WaitForReadyOutcome { ready: true, timed_out: false, disconnected: false };
        }
        if self.disconnected.load(Ordering::SeqCst) {
            return WaitForReadyOutcome { ready: false, timed_out: false, disconnected: true };
        }

        match tokio::time::timeout(timeout, self.ready_notify.notified()).await {
            Ok(_) if self.ready.load(Ordering::SeqCst) => WaitForReadyOutcome { ready: true, timed_out: false, disconnected: false },
            Ok(_) => WaitForReadyOutcome { ready: false, timed_out: false, disconnected: true },
            Err(_) => WaitForReadyOutcome { ready: false, timed_out: true, disconnected: false },
        }
    }

    /// Emits `job_started` once the client stream is attached (§6 S-4).
    /// Does not itself transition job state — the first `update_progress`
    /// call still does that.
    pub async fn emit_started(&self, total_count: u32, estimated_duration: Option<f64>) {
        self.emit(StreamPayload::JobStarted { total_count, estimated_duration }).await;
    }

    /// `updateProgress`: transitions pending → running on the first call,
    /// throttles identical successive progress values, and emits
    /// `job_progress`.
    pub async fn update_progress(&self, progress: f32, status: impl Into<String>, processed_count: Option<u32>, current_item: Option<String>) {
        {
            let mut job = self.job.lock().await;
            if job.state == JobState::Pending {
                let _ = job.transition_to(JobState::Running);
            }
            if let Some(count) = processed_count {
                job.processed = count;
            }
        }

        let mut last = self.last_reported_progress.lock().await;
        if *last == Some(progress) {
            return;
        }
        *last = Some(progress);
        drop(last);

        self.emit(StreamPayload::JobProgress { progress, status: status.into(), processed_count, current_item }).await;
    }

    /// `complete`: transitions → complete and emits `job_complete`. The
    /// caller is responsible for writing the full payload to the results
    /// store before calling this (§4.8) — `results_url` is passed through
    /// as-is.
    pub async fn complete(&self, summary: StreamPayload) {
        {
            let mut job = self.job.lock().await;
            let _ = job.transition_to(JobState::Complete);
        }
        self.emit(summary).await;
    }

    /// `sendError`: transitions → failed and emits `error`. The singleton
    /// is never left in a non-terminal state after a worker exception.
    pub async fn send_error(&self, code: impl Into<String>, message: impl Into<String>, retryable: bool, details: Option<serde_json::Value>) {
        {
            let mut job = self.job.lock().await;
            let _ = job.transition_to(JobState::Failed);
        }
        self.emit(StreamPayload::Error { code: code.into(), message: message.into(), retryable, details }).await;
    }

    /// Called when the worker observes cancellation at a safe polling
    /// point: emits a terminal progress message and transitions → canceled.
    pub async fn cancel(&self, progress: f32, status: impl Into<String>) {
        {
            let mut job = self.job.lock().await;
            let _ = job.transition_to(JobState::Canceled);
        }
        self.emit(StreamPayload::JobProgress { progress, status: status.into(), processed_count: None, current_item: None }).await;
    }

    pub async fn state(&self) -> JobState {
        self.job.lock().await.state
    }

    async fn emit(&self, payload: StreamPayload) {
        let (job_id, pipeline) = {
            let job = self.job.lock().await;
            (job.id, job.pipeline)
        };
        let message = StreamMessage::new(job_id, pipeline, payload);
        if let Some(sender) = self.sender.lock().await.as_ref() {
            let _ = sender.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_for_ready_returns_immediately_once_signaled() {
        let handle = JobHandle::new(Pipeline::AiScan);
        handle.signal_ready();
        let outcome = handle.wait_for_ready(std::time::Duration::from_millis(10)).await;
        assert!(outcome.ready);
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn wait_for_ready_times_out_and_lets_the_worker_proceed() {
        let handle = JobHandle::new(Pipeline::AiScan);
        let outcome = handle.wait_for_ready(std::time::Duration::from_millis(5)).await;
        assert!(outcome.timed_out);
        assert!(!outcome.ready);
    }

    #[tokio::test]
    async fn first_progress_update_transitions_pending_to_running() {
        let handle = JobHandle::new(Pipeline::BatchEnrichment);
        handle.update_progress(0.1, "working", Some(1), None).await;
        assert_eq!(handle.state().await, JobState::Running);
    }

    #[tokio::test]
    async fn cancel_requested_is_observable_without_a_state_transition() {
        let handle = JobHandle::new(Pipeline::CsvImport);
        handle.request_cancel();
        assert!(handle.is_canceled());
        assert_eq!(handle.state().await, JobState::Pending);
    }

    #[tokio::test]
    async fn complete_transitions_into_a_terminal_state() {
        let handle = JobHandle::new(Pipeline::BatchEnrichment);
        handle.update_progress(0.5, "working", None, None).await;
        handle
            .complete(StreamPayload::JobComplete {
                total_detected: None,
                books_count: Some(3),
                approved: None,
                needs_review: None,
                results_url: "/v1/csv/results/abc".to_string(),
                metadata: None,
            })
            .await;
        assert_eq!(handle.state().await, JobState::Complete);
    }
}
