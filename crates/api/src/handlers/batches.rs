//! Handlers for the `/batches` resource.
//!
//! A batch groups one action applied across many targets. Item failures
//! never abort the rest of the batch; they come back in the submission
//! report and the planned slot stays pending in the derived status.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use quill_core::target::Target;
use quill_core::types::BatchId;
use quill_engine::dispatcher::BatchRequest;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /api/v1/batches`.
#[derive(Debug, Deserialize)]
pub struct SubmitBatch {
    pub action: String,
    pub field: String,
    pub targets: Vec<Target>,
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
    /// Opaque key/value metadata stored on the batch (e.g. collection name).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Maximum targets per batch submission.
const MAX_BATCH_TARGETS: usize = 500;

/// POST /api/v1/batches
///
/// Dispatch one action across many targets. Returns 202 with the batch
/// id, the dispatched job ids, and per-item failures for targets that
/// were rejected at validation time.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(input): Json<SubmitBatch>,
) -> AppResult<impl IntoResponse> {
    if input.targets.is_empty() {
        return Err(AppError::BadRequest(
            "a batch needs at least one target".into(),
        ));
    }
    if input.targets.len() > MAX_BATCH_TARGETS {
        return Err(AppError::BadRequest(format!(
            "a batch may contain at most {MAX_BATCH_TARGETS} targets"
        )));
    }

    let report = state
        .dispatcher
        .dispatch_batch(BatchRequest {
            action_handle: input.action,
            field_handle: input.field,
            targets: input.targets,
            variables: input.variables,
            metadata: input.metadata,
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: report })))
}

/// GET /api/v1/batches/{id}
///
/// Poll one batch. Status is derived from the member jobs on every read;
/// there is no cached aggregate.
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<BatchId>,
) -> AppResult<impl IntoResponse> {
    let view = state.aggregator.get_batch(batch_id).await?;
    Ok(Json(DataResponse { data: view }))
}
