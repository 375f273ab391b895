//! Job records and their status state machine.
//!
//! A job goes `Queued -> Processing -> {Completed | Failed}`. Terminal
//! states are absorbing: every transition method refuses to move a job
//! out of `Completed` or `Failed`. `result` and `error` are mutually
//! exclusive and only ever set together with the matching terminal state.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a single dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Stable string form used in logs and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// What the job was dispatched against. Set once at creation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    /// `"entry"` or `"asset"`.
    pub target_kind: String,
    pub target_id: String,
    pub field_handle: String,
    pub action_handle: String,
}

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

/// One tracked unit of asynchronous work, owned by the job store.
///
/// The dispatcher writes the initial `Queued` record; exactly one worker
/// performs every subsequent write. No other component mutates a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub context: JobContext,
    /// Present only when `status == Completed`.
    pub result: Option<serde_json::Value>,
    /// Present only when `status == Failed`.
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// Create a fresh job in `Queued` status.
    pub fn queued(id: JobId, context: JobContext) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            context,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition `Queued -> Processing` (worker pickup).
    pub fn start(&mut self) -> Result<(), CoreError> {
        self.transition_to(JobStatus::Processing)?;
        Ok(())
    }

    /// Transition to `Completed` with a result payload.
    pub fn complete(&mut self, result: serde_json::Value) -> Result<(), CoreError> {
        self.transition_to(JobStatus::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    /// Transition to `Failed` with a human-readable error message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), CoreError> {
        self.transition_to(JobStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Enforce monotonic transitions: never out of a terminal state,
    /// never backwards from `Processing` to `Queued`.
    fn transition_to(&mut self, next: JobStatus) -> Result<(), CoreError> {
        let legal = match (self.status, next) {
            (JobStatus::Queued, JobStatus::Processing) => true,
            (JobStatus::Queued, JobStatus::Completed) => true,
            (JobStatus::Queued, JobStatus::Failed) => true,
            (JobStatus::Processing, JobStatus::Completed) => true,
            (JobStatus::Processing, JobStatus::Failed) => true,
            _ => false,
        };
        if !legal {
            return Err(CoreError::Conflict(format!(
                "illegal job transition {} -> {} for job {}",
                self.status.as_str(),
                next.as_str(),
                self.id,
            )));
        }
        self.status = next;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }
}
