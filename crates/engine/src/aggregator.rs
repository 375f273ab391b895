//! Batch aggregation: group jobs under a batch id and derive status on read.
//!
//! The aggregator reads the job store; it never writes job state. There
//! is no cached aggregate — every `get_batch` call re-reads the member
//! jobs, so batch status is always consistent with the latest job states.
//! A member whose record was evicted past its TTL is excluded from the
//! tallies and therefore shows up in `pending` (documented in DESIGN.md).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use quill_core::batch::{self, Batch, BatchProgress};
use quill_core::error::CoreError;
use quill_core::types::{BatchId, JobId, Timestamp};
use quill_store::{BatchStore, JobStore};

/// One batch as returned to pollers: record fields plus derived progress.
#[derive(Debug, Clone, Serialize)]
pub struct BatchView {
    pub id: BatchId,
    pub action_handle: String,
    pub member_job_ids: Vec<JobId>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub progress: BatchProgress,
}

/// Groups jobs into batches and derives aggregate status.
pub struct BatchAggregator {
    batches: Arc<dyn BatchStore>,
    jobs: Arc<dyn JobStore>,
}

impl BatchAggregator {
    pub fn new(batches: Arc<dyn BatchStore>, jobs: Arc<dyn JobStore>) -> Self {
        Self { batches, jobs }
    }

    /// Create an empty batch sized for `expected_total` members.
    pub async fn create_batch(
        &self,
        action_handle: &str,
        expected_total: usize,
        metadata: BTreeMap<String, String>,
    ) -> Result<BatchId, CoreError> {
        let batch = Batch::new(uuid::Uuid::new_v4(), action_handle, expected_total, metadata);
        let id = batch.id;
        self.batches
            .put_batch(batch)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        tracing::info!(batch_id = %id, action = action_handle, expected_total, "Batch created");
        Ok(id)
    }

    /// Record a dispatched job as a member. Append-if-absent.
    pub async fn add_member(&self, batch_id: BatchId, job_id: JobId) -> Result<(), CoreError> {
        self.batches
            .add_member(batch_id, job_id)
            .await
            .map_err(|e| match e {
                quill_store::StoreError::BatchNotFound(id) => CoreError::NotFound {
                    entity: "Batch",
                    id: id.to_string(),
                },
                other => CoreError::Internal(other.to_string()),
            })
    }

    /// Read the batch and derive its aggregate status from whichever
    /// member jobs still resolve.
    pub async fn get_batch(&self, batch_id: BatchId) -> Result<BatchView, CoreError> {
        let batch = self
            .batches
            .get_batch(batch_id)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or(CoreError::NotFound {
                entity: "Batch",
                id: batch_id.to_string(),
            })?;

        let reads = batch
            .member_job_ids
            .iter()
            .map(|id| self.jobs.get_job(*id));
        let mut statuses = Vec::with_capacity(batch.member_job_ids.len());
        for job in futures::future::join_all(reads).await {
            let job = job.map_err(|e| CoreError::Internal(e.to_string()))?;
            if let Some(job) = job {
                statuses.push(job.status);
            }
            // Absent member: evicted or lost; excluded from the tallies.
        }

        let progress = batch::derive_progress(batch.expected_total, &statuses);

        Ok(BatchView {
            id: batch.id,
            action_handle: batch.action_handle,
            member_job_ids: batch.member_job_ids,
            metadata: batch.metadata,
            created_at: batch.created_at,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quill_core::batch::BatchStatus;
    use quill_core::job::{Job, JobContext};
    use quill_store::MemoryStore;
    use serde_json::json;

    fn aggregator() -> (Arc<MemoryStore>, BatchAggregator) {
        let store = Arc::new(MemoryStore::default());
        let aggregator = BatchAggregator::new(store.clone(), store.clone());
        (store, aggregator)
    }

    async fn seed_job(store: &MemoryStore, terminal: Option<Result<(), &str>>) -> JobId {
        let mut job = Job::queued(
            uuid::Uuid::new_v4(),
            JobContext {
                target_kind: "entry".into(),
                target_id: "e1".into(),
                field_handle: "tags".into(),
                action_handle: "extract-tags".into(),
            },
        );
        if let Some(outcome) = terminal {
            job.start().unwrap();
            match outcome {
                Ok(()) => job.complete(json!({"tags": ["a"]})).unwrap(),
                Err(msg) => job.fail(msg).unwrap(),
            }
        }
        let id = job.id;
        store.put_job(job).await.unwrap();
        id
    }

    #[tokio::test]
    async fn unknown_batch_is_not_found() {
        let (_store, aggregator) = aggregator();
        let err = aggregator.get_batch(uuid::Uuid::new_v4()).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Batch", .. });
    }

    #[tokio::test]
    async fn mixed_outcomes_partial_failure() {
        let (store, aggregator) = aggregator();
        let batch_id = aggregator
            .create_batch("extract-tags", 3, BTreeMap::new())
            .await
            .unwrap();

        for outcome in [Some(Ok(())), Some(Ok(())), Some(Err("boom"))] {
            let job_id = seed_job(&store, outcome).await;
            aggregator.add_member(batch_id, job_id).await.unwrap();
        }

        let view = aggregator.get_batch(batch_id).await.unwrap();
        assert_eq!(view.progress.completed, 2);
        assert_eq!(view.progress.failed, 1);
        assert_eq!(view.progress.pending, 0);
        assert_eq!(view.progress.status, BatchStatus::PartialFailure);
    }

    #[tokio::test]
    async fn undispatched_slot_keeps_batch_processing() {
        let (store, aggregator) = aggregator();
        let batch_id = aggregator
            .create_batch("extract-tags", 2, BTreeMap::new())
            .await
            .unwrap();

        // One member in Processing; the second slot was never dispatched.
        let mut job = Job::queued(
            uuid::Uuid::new_v4(),
            JobContext {
                target_kind: "entry".into(),
                target_id: "e2".into(),
                field_handle: "tags".into(),
                action_handle: "extract-tags".into(),
            },
        );
        job.start().unwrap();
        let job_id = job.id;
        store.put_job(job).await.unwrap();
        aggregator.add_member(batch_id, job_id).await.unwrap();

        let view = aggregator.get_batch(batch_id).await.unwrap();
        assert_eq!(view.progress.status, BatchStatus::Processing);
        assert_eq!(view.progress.processing, 1);
        assert_eq!(view.progress.pending, 1);
    }

    #[tokio::test]
    async fn repeated_reads_without_updates_are_identical() {
        let (store, aggregator) = aggregator();
        let batch_id = aggregator
            .create_batch("extract-tags", 2, BTreeMap::new())
            .await
            .unwrap();
        let job_id = seed_job(&store, Some(Ok(()))).await;
        aggregator.add_member(batch_id, job_id).await.unwrap();

        let first = aggregator.get_batch(batch_id).await.unwrap();
        let second = aggregator.get_batch(batch_id).await.unwrap();
        assert_eq!(first.progress, second.progress);
    }

    #[tokio::test]
    async fn evicted_member_counts_as_pending() {
        let (store, aggregator) = aggregator();
        let batch_id = aggregator
            .create_batch("extract-tags", 2, BTreeMap::new())
            .await
            .unwrap();

        let resolved = seed_job(&store, Some(Ok(()))).await;
        aggregator.add_member(batch_id, resolved).await.unwrap();
        // Member id that never reached the job store (or was evicted).
        aggregator
            .add_member(batch_id, uuid::Uuid::new_v4())
            .await
            .unwrap();

        let view = aggregator.get_batch(batch_id).await.unwrap();
        assert_eq!(view.progress.completed, 1);
        assert_eq!(view.progress.failed, 0);
        assert_eq!(view.progress.pending, 1);
        assert_eq!(view.progress.status, BatchStatus::Processing);
    }

    #[tokio::test]
    async fn metadata_round_trips() {
        let (_store, aggregator) = aggregator();
        let mut metadata = BTreeMap::new();
        metadata.insert("collection".to_string(), "articles".to_string());
        let batch_id = aggregator
            .create_batch("extract-tags", 0, metadata.clone())
            .await
            .unwrap();

        let view = aggregator.get_batch(batch_id).await.unwrap();
        assert_eq!(view.metadata, metadata);
        assert_eq!(view.progress.status, BatchStatus::Pending);
    }
}
