//! Job — an asynchronous pipeline run tracked for its lifetime (§3, §4.7).

use crate::types::{JobState, Pipeline};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Total lifetime of a stream auth token before it must be refreshed.
pub const STREAM_TOKEN_TTL: Duration = Duration::hours(2);
/// A token may be refreshed once it has this much time left before expiry.
pub const STREAM_TOKEN_REFRESH_WINDOW: Duration = Duration::minutes(30);

/// A single-use bearer token scoped to one job's WebSocket stream (§4.7).
/// `consume()` may only succeed once; a caller that needs a longer-lived
/// connection must `refresh()` within the last 30 minutes of the token's
/// 2-hour lifetime, which mints a fresh token without invalidating the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub consumed: bool,
}

impl StreamToken {
    pub fn issue(now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            issued_at: now,
            expires_at: now + STREAM_TOKEN_TTL,
            consumed: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Eligible for refresh once inside the last 30 minutes before expiry.
    pub fn is_refreshable(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.expires_at - now <= STREAM_TOKEN_REFRESH_WINDOW
    }

    /// Mint a replacement token. Does not retroactively invalidate `self`;
    /// callers are expected to discard the old token once the new one is
    /// in hand.
    pub fn refresh(&self, now: DateTime<Utc>) -> StreamToken {
        StreamToken::issue(now)
    }

    /// Mark the token consumed. Returns `false` if it was already consumed
    /// or has expired, in which case the caller must reject the connection.
    pub fn try_consume(&mut self, now: DateTime<Utc>) -> bool {
        if self.consumed || self.is_expired(now) {
            return false;
        }
        self.consumed = true;
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub pipeline: Pipeline,
    pub created_at: DateTime<Utc>,
    pub state: JobState,
    pub total: u32,
    pub processed: u32,
    /// Set once the client has opened the WebSocket stream for this job;
    /// used to decide whether a late-arriving progress event still has a
    /// listener (§4.7).
    pub client_ready: bool,
    pub cancel_requested: bool,
    pub stream_token: StreamToken,
}

impl Job {
    pub fn new(pipeline: Pipeline, total: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline,
            created_at: now,
            state: JobState::Pending,
            total,
            processed: 0,
            client_ready: false,
            cancel_requested: false,
            stream_token: StreamToken::issue(now),
        }
    }

    /// I-4: terminal states are absorbing — no transition is valid once a
    /// job has reached `Complete`, `Failed`, or `Canceled`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        match (self.state, next) {
            (JobState::Pending, JobState::Running) => true,
            (JobState::Pending, JobState::Canceled) => true,
            (JobState::Running, JobState::Complete) => true,
            (JobState::Running, JobState::Failed) => true,
            (JobState::Running, JobState::Canceled) => true,
            _ => false,
        }
    }

    pub fn transition_to(&mut self, next: JobState) -> bool {
        if !self.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn progress_ratio(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f32 / self.total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut job = Job::new(Pipeline::BatchEnrichment, 10, Utc::now());
        job.transition_to(JobState::Running);
        job.transition_to(JobState::Complete);
        assert!(!job.can_transition_to(JobState::Failed));
        assert!(!job.transition_to(JobState::Running));
    }

    #[test]
    fn pending_can_move_to_running_or_canceled_only() {
        let job = Job::new(Pipeline::CsvImport, 1, Utc::now());
        assert!(job.can_transition_to(JobState::Running));
        assert!(job.can_transition_to(JobState::Canceled));
        assert!(!job.can_transition_to(JobState::Complete));
        assert!(!job.can_transition_to(JobState::Failed));
    }

    #[test]
    fn stream_token_refreshable_only_near_expiry() {
        let now = Utc::now();
        let token = StreamToken::issue(now);
        assert!(!token.is_refreshable(now));
        assert!(token.is_refreshable(now + Duration::minutes(95)));
    }

    #[test]
    fn stream_token_consumed_only_once() {
        let mut token = StreamToken::issue(Utc::now());
        assert!(token.try_consume(Utc::now()));
        assert!(!token.try_consume(Utc::now()));
    }

    #[test]
    fn progress_ratio_full_when_total_zero() {
        let job = Job::new(Pipeline::AiScan, 0, Utc::now());
        assert_eq!(job.progress_ratio(), 1.0);
    }
}
