//! Store trait contracts.
//!
//! Per-key last-writer-wins is acceptable for jobs: after the dispatcher's
//! initial write, exactly one worker ever writes a given job. Batch
//! membership is different — `add_member` may race across concurrent
//! dispatch calls and must be append-if-absent, so it is a store-level
//! atomic operation rather than a get/modify/put at the caller.

use async_trait::async_trait;

use quill_core::batch::Batch;
use quill_core::job::Job;
use quill_core::types::{BatchId, JobId};

/// Errors from a store implementation.
///
/// The in-memory store never fails; remote implementations surface
/// transport problems through `Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Batch not found: {0}")]
    BatchNotFound(BatchId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed job records with bounded TTL.
///
/// A record past its TTL is absent: `get` returns `None` for it exactly
/// as for an id that never existed.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace a job record, refreshing its TTL window.
    async fn put_job(&self, job: Job) -> Result<(), StoreError>;

    /// Read a job record. `None` when unknown or evicted.
    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StoreError>;
}

/// Keyed batch records with bounded TTL and mergeable membership.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Insert or replace a batch record.
    async fn put_batch(&self, batch: Batch) -> Result<(), StoreError>;

    /// Read a batch record. `None` when unknown or evicted.
    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError>;

    /// Append a member job id if not already present.
    ///
    /// Atomic with respect to concurrent `add_member` calls for the same
    /// batch. Fails with `BatchNotFound` when the batch is unknown.
    async fn add_member(&self, id: BatchId, job_id: JobId) -> Result<(), StoreError>;
}
