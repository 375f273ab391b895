//! Concurrent in-memory store with per-entry TTL.
//!
//! Entries carry a deadline (`inserted + ttl`). Reads treat expired
//! entries as absent; a periodic sweep ([`MemoryStore::purge_expired`],
//! driven by the API's background retention task) reclaims the memory.
//! Jobs and batches live in separate keyspaces behind separate locks so
//! job traffic never contends with batch membership updates.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::batch::Batch;
use quill_core::job::Job;
use quill_core::types::{BatchId, JobId};

use crate::traits::{BatchStore, JobStore, StoreError};

/// Default record lifetime: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`JobStore`] + [`BatchStore`] implementation.
pub struct MemoryStore {
    ttl: Duration,
    jobs: RwLock<HashMap<JobId, Entry<Job>>>,
    batches: RwLock<HashMap<BatchId, Entry<Batch>>>,
}

impl MemoryStore {
    /// Create a store with the given record TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            jobs: RwLock::new(HashMap::new()),
            batches: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every expired entry. Returns the number of records purged.
    pub async fn purge_expired(&self) -> usize {
        let mut purged = 0;

        {
            let mut jobs = self.jobs.write().await;
            let before = jobs.len();
            jobs.retain(|_, entry| !entry.is_expired());
            purged += before - jobs.len();
        }
        {
            let mut batches = self.batches.write().await;
            let before = batches.len();
            batches.retain(|_, entry| !entry.is_expired());
            purged += before - batches.len();
        }

        purged
    }

    /// Number of live (non-expired) job records.
    pub async fn job_count(&self) -> usize {
        let jobs = self.jobs.read().await;
        jobs.values().filter(|e| !e.is_expired()).count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn put_job(&self, job: Job) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id, Entry::new(job, self.ttl));
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .get(&id)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn put_batch(&self, batch: Batch) -> Result<(), StoreError> {
        let mut batches = self.batches.write().await;
        batches.insert(batch.id, Entry::new(batch, self.ttl));
        Ok(())
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        let batches = self.batches.read().await;
        Ok(batches
            .get(&id)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn add_member(&self, id: BatchId, job_id: JobId) -> Result<(), StoreError> {
        let mut batches = self.batches.write().await;
        let entry = batches
            .get_mut(&id)
            .filter(|entry| !entry.is_expired())
            .ok_or(StoreError::BatchNotFound(id))?;

        if !entry.value.member_job_ids.contains(&job_id) {
            entry.value.member_job_ids.push(job_id);
        }
        Ok(())
    }
}
