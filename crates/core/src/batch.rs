//! Batch records and derived aggregate status.
//!
//! A batch has no status of its own. Its aggregate status is a pure
//! function of `expected_total` and the statuses of whichever member jobs
//! still resolve in the store at read time, recomputed on every read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job::JobStatus;
use crate::types::{BatchId, JobId, Timestamp};

// ---------------------------------------------------------------------------
// Batch record
// ---------------------------------------------------------------------------

/// One group dispatch, owned by the batch store.
///
/// `expected_total` is the planning-time count of intended members and may
/// exceed actual membership when some dispatch attempts failed before
/// reaching the store. `member_job_ids` only grows and never holds
/// duplicates; the store's `add_member` enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub action_handle: String,
    pub expected_total: usize,
    pub member_job_ids: Vec<JobId>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: Timestamp,
}

impl Batch {
    /// Create a new batch with no members yet.
    pub fn new(
        id: BatchId,
        action_handle: impl Into<String>,
        expected_total: usize,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id,
            action_handle: action_handle.into(),
            expected_total,
            member_job_ids: Vec::new(),
            metadata,
            created_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived status
// ---------------------------------------------------------------------------

/// Aggregate status derived from member job statuses on each read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    PartialFailure,
}

/// Tallies plus derived status for one batch read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub expected_total: usize,
    pub completed: usize,
    pub failed: usize,
    pub processing: usize,
    pub pending: usize,
    pub status: BatchStatus,
}

/// Derive batch progress from the member job statuses that resolved.
///
/// `member_statuses` carries one entry per member id that was still
/// present in the job store; members evicted past their TTL are simply
/// absent and therefore land in `pending` (they never count as failed).
///
/// `pending` counts the slots with no observed activity: expected members
/// that are queued, unresolved, or were never dispatched. Members seen in
/// `Processing` are tallied separately and do not count as pending.
///
/// Status rules, keyed on `remaining = expected_total - completed - failed`:
/// - `expected_total == 0`                      -> `Pending`
/// - `remaining == 0 && failed == 0`            -> `Completed`
/// - `remaining == 0 && completed == 0`         -> `Failed`
/// - `remaining == 0`                           -> `PartialFailure`
/// - any progress observed                      -> `Processing`
/// - otherwise                                  -> `Pending`
pub fn derive_progress(expected_total: usize, member_statuses: &[JobStatus]) -> BatchProgress {
    let completed = member_statuses
        .iter()
        .filter(|s| **s == JobStatus::Completed)
        .count();
    let failed = member_statuses
        .iter()
        .filter(|s| **s == JobStatus::Failed)
        .count();
    let processing = member_statuses
        .iter()
        .filter(|s| **s == JobStatus::Processing)
        .count();
    let remaining = expected_total.saturating_sub(completed + failed);
    let pending = remaining.saturating_sub(processing);

    let status = if expected_total == 0 {
        BatchStatus::Pending
    } else if remaining == 0 && failed == 0 {
        BatchStatus::Completed
    } else if remaining == 0 && completed == 0 {
        BatchStatus::Failed
    } else if remaining == 0 {
        BatchStatus::PartialFailure
    } else if completed > 0 || failed > 0 || processing > 0 {
        BatchStatus::Processing
    } else {
        BatchStatus::Pending
    };

    BatchProgress {
        expected_total,
        completed,
        failed,
        processing,
        pending,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use JobStatus::*;

    #[test]
    fn empty_batch_is_pending() {
        let p = derive_progress(0, &[]);
        assert_eq!(p.status, BatchStatus::Pending);
        assert_eq!(p.pending, 0);
    }

    #[test]
    fn all_completed() {
        let p = derive_progress(2, &[Completed, Completed]);
        assert_eq!(p.status, BatchStatus::Completed);
        assert_eq!((p.completed, p.failed, p.pending), (2, 0, 0));
    }

    #[test]
    fn all_failed() {
        let p = derive_progress(2, &[Failed, Failed]);
        assert_eq!(p.status, BatchStatus::Failed);
        assert_eq!((p.completed, p.failed, p.pending), (0, 2, 0));
    }

    #[test]
    fn mixed_terminal_is_partial_failure() {
        let p = derive_progress(3, &[Completed, Completed, Failed]);
        assert_eq!(p.status, BatchStatus::PartialFailure);
        assert_eq!((p.completed, p.failed, p.pending), (2, 1, 0));
    }

    #[test]
    fn undispatched_slot_with_processing_member() {
        // expected_total=2, one member Processing, second slot never
        // dispatched: the in-flight member is not pending, the empty
        // slot is.
        let p = derive_progress(2, &[Processing]);
        assert_eq!(p.status, BatchStatus::Processing);
        assert_eq!(p.processing, 1);
        assert_eq!(p.pending, 1);
    }

    #[test]
    fn all_members_in_flight_leaves_nothing_pending() {
        let p = derive_progress(2, &[Processing, Processing]);
        assert_eq!(p.status, BatchStatus::Processing);
        assert_eq!((p.processing, p.pending), (2, 0));
    }

    #[test]
    fn some_terminal_progress_is_processing() {
        let p = derive_progress(3, &[Completed, Queued, Queued]);
        assert_eq!(p.status, BatchStatus::Processing);
        assert_eq!(p.pending, 2);
    }

    #[test]
    fn only_queued_members_is_pending() {
        let p = derive_progress(2, &[Queued, Queued]);
        assert_eq!(p.status, BatchStatus::Pending);
        assert_eq!(p.pending, 2);
    }

    #[test]
    fn evicted_members_count_as_pending_not_failed() {
        // Three members expected, one evicted from the store: only two
        // statuses resolve. The evicted member keeps the batch pending.
        let p = derive_progress(3, &[Completed, Completed]);
        assert_eq!(p.status, BatchStatus::Processing);
        assert_eq!((p.completed, p.failed, p.pending), (2, 0, 1));
    }

    #[test]
    fn more_terminal_members_than_expected_never_underflows() {
        // expected_total fixed at planning time may lag actual membership.
        let p = derive_progress(1, &[Completed, Completed]);
        assert_eq!(p.pending, 0);
        assert_eq!(p.status, BatchStatus::Completed);
    }

    #[test]
    fn derivation_is_idempotent() {
        let members = [Completed, Failed, Processing];
        assert_eq!(derive_progress(5, &members), derive_progress(5, &members));
    }
}
