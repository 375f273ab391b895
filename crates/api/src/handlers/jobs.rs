//! Handlers for the `/jobs` resource.
//!
//! Submission validates eligibility and context before any state is
//! written; polling reads the job store by id. An unknown or TTL-evicted
//! id is a 404, distinct from a job that is still queued or processing.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use quill_core::error::CoreError;
use quill_core::job::JobStatus;
use quill_core::target::{AssetInfo, Target};
use quill_core::types::JobId;
use quill_engine::{DispatchRequest, ExecutionMode};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /api/v1/jobs`.
///
/// The CMS is the caller and owns target resolution: it submits a
/// snapshot of the target, its blueprint, and its field values.
#[derive(Debug, Deserialize)]
pub struct SubmitJob {
    pub action: String,
    pub field: String,
    pub target: Target,
    /// Explicit input asset for actions on entries.
    #[serde(default)]
    pub asset: Option<AssetInfo>,
    /// Caller variables, merged over the action's parameter defaults.
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
    /// Execution mode; defaults to async (poll for the result).
    #[serde(default)]
    pub mode: ExecutionMode,
}

/// Response body for a submission.
#[derive(Debug, Serialize)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Present only for synchronous submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// POST /api/v1/jobs
///
/// Submit one action execution. Returns 202 with the job id for async
/// mode; 200 with the inline result for sync mode. Validation failures
/// (ineligible action, unsupported format, unresolvable context) reject
/// the request before any job record exists.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitJob>,
) -> AppResult<impl IntoResponse> {
    let mode = input.mode;
    let dispatched = state
        .dispatcher
        .dispatch(
            DispatchRequest {
                action_handle: input.action,
                field_handle: input.field,
                target: input.target,
                asset: input.asset,
                variables: input.variables,
            },
            mode,
        )
        .await?;

    let (status_code, job_status) = match mode {
        ExecutionMode::Async => (StatusCode::ACCEPTED, JobStatus::Queued),
        ExecutionMode::Sync => (StatusCode::OK, JobStatus::Completed),
    };

    Ok((
        status_code,
        Json(DataResponse {
            data: SubmittedJob {
                job_id: dispatched.job_id,
                status: job_status,
                result: dispatched.result,
            },
        }),
    ))
}

/// GET /api/v1/jobs/{id}
///
/// Poll one job. The full record is returned: status, context, and on
/// terminal states the result or error message.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state
        .jobs
        .get_job(job_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Job",
            id: job_id.to_string(),
        })?;

    Ok(Json(DataResponse { data: job }))
}
