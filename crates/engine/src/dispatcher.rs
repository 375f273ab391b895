//! The dispatcher: single orchestration entry point for all execution.
//!
//! Validation and bookkeeping are written exactly once; the execution
//! mode only selects the channel — enqueue for background workers, or
//! inline for synchronous callers. Validation failures (`Ineligible`,
//! `UnsupportedFormat`, `InvalidContext`) surface before any job record
//! is written, so a rejected dispatch leaves no state behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use quill_core::action::CapabilityType;
use quill_core::catalog::Catalog;
use quill_core::error::CoreError;
use quill_core::job::{Job, JobContext, JobStatus};
use quill_core::target::{AssetInfo, Target};
use quill_core::types::{BatchId, JobId};
use quill_store::JobStore;

use crate::aggregator::BatchAggregator;
use crate::context::resolve_variables;
use crate::eligibility::assert_executable;
use crate::worker::{WorkUnit, Worker};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// How the unit of work is executed after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Enqueue for the worker pool; the caller polls for the result.
    #[default]
    Async,
    /// Execute inline and block until a terminal state. Not for bulk use.
    Sync,
}

/// Model identifiers per capability, chosen at deployment time.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub text: String,
    pub vision: String,
    pub audio: String,
}

impl ModelConfig {
    fn for_capability(&self, capability: CapabilityType) -> &str {
        match capability {
            CapabilityType::Text => &self.text,
            CapabilityType::Vision => &self.vision,
            CapabilityType::Audio => &self.audio,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: "gateway-text-default".into(),
            vision: "gateway-vision-default".into(),
            audio: "gateway-audio-default".into(),
        }
    }
}

/// One requested action execution against a target/field.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub action_handle: String,
    pub field_handle: String,
    pub target: Target,
    /// Explicit input asset for actions on entries (the target's own
    /// asset metadata wins when the target is asset-like).
    pub asset: Option<AssetInfo>,
    /// Caller-supplied variables, merged over parameter defaults.
    pub variables: BTreeMap<String, serde_json::Value>,
}

/// Outcome of a successful dispatch call.
#[derive(Debug, Clone, Serialize)]
pub struct Dispatched {
    pub job_id: JobId,
    /// Present only for synchronous dispatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// Per-item failure inside a batch dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemFailure {
    pub target_id: String,
    pub error: String,
}

/// Outcome of a batch dispatch: which jobs made it, which items did not.
#[derive(Debug, Serialize)]
pub struct BatchDispatchReport {
    pub batch_id: BatchId,
    pub job_ids: Vec<JobId>,
    pub failures: Vec<BatchItemFailure>,
}

/// A batch dispatch request: one action and field across many targets.
#[derive(Debug)]
pub struct BatchRequest {
    pub action_handle: String,
    pub field_handle: String,
    pub targets: Vec<Target>,
    pub variables: BTreeMap<String, serde_json::Value>,
    pub metadata: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    catalog: Arc<Catalog>,
    jobs: Arc<dyn JobStore>,
    aggregator: Arc<BatchAggregator>,
    queue: mpsc::Sender<WorkUnit>,
    worker: Arc<Worker>,
    models: ModelConfig,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<Catalog>,
        jobs: Arc<dyn JobStore>,
        aggregator: Arc<BatchAggregator>,
        queue: mpsc::Sender<WorkUnit>,
        worker: Arc<Worker>,
        models: ModelConfig,
    ) -> Self {
        Self {
            catalog,
            jobs,
            aggregator,
            queue,
            worker,
            models,
        }
    }

    /// Validate, create the job record, and hand off to execution.
    ///
    /// Async mode returns as soon as the unit is queued; sync mode blocks
    /// until the terminal state and fails with `ExecutionFailed` when the
    /// job ends `Failed`.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        mode: ExecutionMode,
    ) -> Result<Dispatched, CoreError> {
        let descriptor = assert_executable(
            &self.catalog,
            &request.action_handle,
            &request.target,
            &request.field_handle,
            request.asset.as_ref(),
        )?;

        let variables = resolve_variables(descriptor, &request.target, &request.variables)?;
        let asset = request
            .target
            .own_asset()
            .cloned()
            .or(request.asset.clone());

        let job = Job::queued(
            uuid::Uuid::new_v4(),
            JobContext {
                target_kind: request.target.kind().to_string(),
                target_id: request.target.id().to_string(),
                field_handle: request.field_handle.clone(),
                action_handle: descriptor.handle.clone(),
            },
        );
        let job_id = job.id;
        self.jobs
            .put_job(job)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        let unit = WorkUnit {
            job_id,
            action_handle: descriptor.handle.clone(),
            capability: descriptor.capability,
            model: self.models.for_capability(descriptor.capability).to_string(),
            variables,
            asset,
        };

        tracing::info!(
            job_id = %job_id,
            action = %unit.action_handle,
            target = %request.target.id(),
            field = %request.field_handle,
            mode = ?mode,
            "Job dispatched",
        );

        match mode {
            ExecutionMode::Async => {
                if self.queue.send(unit).await.is_err() {
                    // Queue closed (shutdown mid-request): the record exists
                    // but nothing will run it, so fail it in place.
                    self.fail_unrunnable(job_id).await;
                    return Err(CoreError::Internal(
                        "execution queue is unavailable".to_string(),
                    ));
                }
                Ok(Dispatched {
                    job_id,
                    result: None,
                })
            }
            ExecutionMode::Sync => {
                let finished = self.worker.execute(unit).await?;
                match finished.status {
                    JobStatus::Completed => Ok(Dispatched {
                        job_id,
                        result: finished.result,
                    }),
                    JobStatus::Failed => Err(CoreError::ExecutionFailed(
                        finished.error.unwrap_or_else(|| "unknown error".to_string()),
                    )),
                    other => Err(CoreError::Internal(format!(
                        "inline execution ended in non-terminal status {}",
                        other.as_str(),
                    ))),
                }
            }
        }
    }

    /// Dispatch one action across many targets as a tracked batch.
    ///
    /// Per-item isolation: a failing item is recorded in the report and
    /// the loop continues. `expected_total` is fixed to the planned count
    /// before any dispatch, so items that never reach the store still
    /// show as pending in the derived batch status.
    pub async fn dispatch_batch(
        &self,
        request: BatchRequest,
    ) -> Result<BatchDispatchReport, CoreError> {
        let batch_id = self
            .aggregator
            .create_batch(
                &request.action_handle,
                request.targets.len(),
                request.metadata,
            )
            .await?;

        let mut job_ids = Vec::with_capacity(request.targets.len());
        let mut failures = Vec::new();

        for target in request.targets {
            let target_id = target.id().to_string();
            let item = DispatchRequest {
                action_handle: request.action_handle.clone(),
                field_handle: request.field_handle.clone(),
                target,
                asset: None,
                variables: request.variables.clone(),
            };

            match self.dispatch(item, ExecutionMode::Async).await {
                Ok(dispatched) => {
                    // Membership failure is an item failure too: the job runs
                    // untracked, but the remaining items still dispatch.
                    match self.aggregator.add_member(batch_id, dispatched.job_id).await {
                        Ok(()) => job_ids.push(dispatched.job_id),
                        Err(e) => {
                            tracing::warn!(
                                batch_id = %batch_id,
                                job_id = %dispatched.job_id,
                                target = %target_id,
                                error = %e,
                                "Batch membership write failed",
                            );
                            failures.push(BatchItemFailure {
                                target_id,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        batch_id = %batch_id,
                        target = %target_id,
                        error = %e,
                        "Batch item dispatch failed",
                    );
                    failures.push(BatchItemFailure {
                        target_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            batch_id = %batch_id,
            dispatched = job_ids.len(),
            failed = failures.len(),
            "Batch dispatch finished",
        );

        Ok(BatchDispatchReport {
            batch_id,
            job_ids,
            failures,
        })
    }

    /// Best-effort terminal write for a job whose unit could not be queued.
    async fn fail_unrunnable(&self, job_id: JobId) {
        if let Ok(Some(mut job)) = self.jobs.get_job(job_id).await {
            if job.fail("execution queue is unavailable").is_ok() {
                if let Err(e) = self.jobs.put_job(job).await {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to record queue failure");
                }
            }
        }
    }
}
