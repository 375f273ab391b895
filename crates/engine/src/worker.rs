//! Workers: consume one unit of work, call the backend, write back
//! terminal state.
//!
//! A worker only ever writes the job store, keyed by job id; it never
//! touches batch records. Backend failures become the job's `Failed`
//! state with the error message — no automatic retry, re-dispatching a
//! new job is the caller's decision.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use quill_core::action::CapabilityType;
use quill_core::error::CoreError;
use quill_core::job::Job;
use quill_core::target::AssetInfo;
use quill_core::types::JobId;
use quill_store::JobStore;

use crate::backend::{GenerationBackend, GenerationRequest};
use crate::render::PromptRenderer;

// ---------------------------------------------------------------------------
// Work unit
// ---------------------------------------------------------------------------

/// Everything a worker needs to execute one job, resolved at dispatch
/// time so the worker never goes back to the CMS.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub job_id: JobId,
    pub action_handle: String,
    pub capability: CapabilityType,
    pub model: String,
    pub variables: BTreeMap<String, serde_json::Value>,
    /// Input asset for vision/audio actions.
    pub asset: Option<AssetInfo>,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Executes work units against the generation backend.
pub struct Worker {
    store: Arc<dyn JobStore>,
    renderer: Arc<dyn PromptRenderer>,
    backend: Arc<dyn GenerationBackend>,
}

impl Worker {
    pub fn new(
        store: Arc<dyn JobStore>,
        renderer: Arc<dyn PromptRenderer>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            store,
            renderer,
            backend,
        }
    }

    /// Run one unit to a terminal state and return the final job record.
    ///
    /// State machine: `Queued -> Processing` on pickup, then
    /// `-> Completed` with the backend output or `-> Failed` with the
    /// error message. Returns `NotFound` when the job record was evicted
    /// before pickup; nothing is executed in that case.
    pub async fn execute(&self, unit: WorkUnit) -> Result<Job, CoreError> {
        let mut job = self
            .store
            .get_job(unit.job_id)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or(CoreError::NotFound {
                entity: "Job",
                id: unit.job_id.to_string(),
            })?;

        job.start()?;
        self.put(&job).await?;

        tracing::debug!(
            job_id = %job.id,
            action = %unit.action_handle,
            capability = unit.capability.as_str(),
            "Job picked up",
        );

        match self.generate(&unit).await {
            Ok(result) => {
                job.complete(result)?;
                tracing::info!(job_id = %job.id, action = %unit.action_handle, "Job completed");
            }
            Err(message) => {
                job.fail(&message)?;
                tracing::warn!(
                    job_id = %job.id,
                    action = %unit.action_handle,
                    error = %message,
                    "Job failed",
                );
            }
        }

        self.put(&job).await?;
        Ok(job)
    }

    /// Render prompts and call the capability-specific backend path.
    async fn generate(&self, unit: &WorkUnit) -> Result<serde_json::Value, String> {
        let prompt = self
            .renderer
            .render(&unit.action_handle, &unit.variables)
            .map_err(|e| e.to_string())?;

        let request = match unit.capability {
            CapabilityType::Text => {
                GenerationRequest::new(unit.capability, &unit.model, prompt)
            }
            CapabilityType::Vision | CapabilityType::Audio => {
                if unit.asset.is_none() {
                    return Err(format!(
                        "action '{}' needs an input asset but none was resolved",
                        unit.action_handle,
                    ));
                }
                GenerationRequest::new(unit.capability, &unit.model, prompt)
                    .with_asset(unit.asset.clone())
            }
        };

        self.backend
            .generate(&request)
            .await
            .map_err(|e| e.to_string())
    }

    async fn put(&self, job: &Job) -> Result<(), CoreError> {
        self.store
            .put_job(job.clone())
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

/// A fixed set of workers draining one shared queue.
///
/// Each worker handles exactly one unit at a time; concurrency equals the
/// pool size. Shutdown is cooperative via the cancellation token — units
/// already picked up run to completion.
pub struct WorkerPool {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `concurrency` workers draining `receiver`.
    pub fn spawn(
        concurrency: usize,
        worker: Arc<Worker>,
        receiver: mpsc::Receiver<WorkUnit>,
        cancel: CancellationToken,
    ) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(concurrency);

        for index in 0..concurrency {
            let worker = Arc::clone(&worker);
            let receiver = Arc::clone(&receiver);
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                tracing::info!(worker = index, "Worker started");
                loop {
                    let unit = tokio::select! {
                        _ = cancel.cancelled() => break,
                        unit = async { receiver.lock().await.recv().await } => unit,
                    };

                    let Some(unit) = unit else {
                        // Queue closed: dispatcher gone, drain finished.
                        break;
                    };

                    let job_id = unit.job_id;
                    if let Err(e) = worker.execute(unit).await {
                        // Evicted record or store failure; the job cannot
                        // be observed anymore, so log and move on.
                        tracing::error!(worker = index, job_id = %job_id, error = %e, "Work unit dropped");
                    }
                }
                tracing::info!(worker = index, "Worker stopped");
            }));
        }

        Self { handles }
    }

    /// Wait for all workers to finish.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::render::BuiltinTemplates;
    use assert_matches::assert_matches;
    use quill_core::job::{JobContext, JobStatus};
    use quill_store::MemoryStore;
    use serde_json::json;

    fn context(action: &str) -> JobContext {
        JobContext {
            target_kind: "entry".into(),
            target_id: "e1".into(),
            field_handle: "title".into(),
            action_handle: action.into(),
        }
    }

    fn unit(job_id: JobId, action: &str, capability: CapabilityType) -> WorkUnit {
        let mut variables = BTreeMap::new();
        variables.insert("body".to_string(), json!("Body text."));
        variables.insert("max_words".to_string(), json!(12));
        variables.insert("tone".to_string(), json!("neutral"));
        WorkUnit {
            job_id,
            action_handle: action.into(),
            capability,
            model: "test-model".into(),
            variables,
            asset: None,
        }
    }

    fn harness() -> (Arc<MemoryStore>, Arc<ScriptedBackend>, Worker) {
        let store = Arc::new(MemoryStore::default());
        let backend = Arc::new(ScriptedBackend::new());
        let worker = Worker::new(
            store.clone(),
            Arc::new(BuiltinTemplates),
            backend.clone(),
        );
        (store, backend, worker)
    }

    #[tokio::test]
    async fn successful_unit_completes_with_result() {
        let (store, backend, worker) = harness();
        backend.push_ok(json!({"title": "Generated Title"}));

        let job = Job::queued(uuid::Uuid::new_v4(), context("propose-title"));
        let id = job.id;
        store.put_job(job).await.unwrap();

        let done = worker
            .execute(unit(id, "propose-title", CapabilityType::Text))
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result, Some(json!({"title": "Generated Title"})));

        let stored = store.get_job(id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert!(stored.error.is_none());
    }

    #[tokio::test]
    async fn backend_failure_becomes_failed_job() {
        let (store, backend, worker) = harness();
        backend.push_err("model overloaded");

        let job = Job::queued(uuid::Uuid::new_v4(), context("propose-title"));
        let id = job.id;
        store.put_job(job).await.unwrap();

        let done = worker
            .execute(unit(id, "propose-title", CapabilityType::Text))
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.error.as_deref().unwrap().contains("model overloaded"));
        assert!(done.result.is_none());
    }

    #[tokio::test]
    async fn vision_unit_without_asset_fails() {
        let (store, _backend, worker) = harness();
        let job = Job::queued(uuid::Uuid::new_v4(), context("alt-text"));
        let id = job.id;
        store.put_job(job).await.unwrap();

        let mut u = unit(id, "alt-text", CapabilityType::Vision);
        u.variables.insert("max_words".to_string(), json!(25));
        let done = worker.execute(u).await.unwrap();
        assert_eq!(done.status, JobStatus::Failed);
        assert!(done.error.unwrap().contains("input asset"));
    }

    #[tokio::test]
    async fn evicted_job_is_not_executed() {
        let (_store, backend, worker) = harness();
        backend.push_ok(json!("never consumed"));

        let err = worker
            .execute(unit(
                uuid::Uuid::new_v4(),
                "propose-title",
                CapabilityType::Text,
            ))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn pool_drains_queue_and_stops_on_cancel() {
        let (store, backend, worker) = harness();
        let worker = Arc::new(worker);
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let pool = WorkerPool::spawn(2, worker, rx, cancel.clone());

        let mut ids = Vec::new();
        for _ in 0..4 {
            backend.push_ok(json!({"title": "t"}));
            let job = Job::queued(uuid::Uuid::new_v4(), context("propose-title"));
            ids.push(job.id);
            store.put_job(job.clone()).await.unwrap();
            tx.send(unit(job.id, "propose-title", CapabilityType::Text))
                .await
                .unwrap();
        }

        // Closing the channel lets the pool drain and exit.
        drop(tx);
        pool.join().await;

        for id in ids {
            let job = store.get_job(id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::Completed);
        }
    }
}
