//! Handlers for the `/actions` resource.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use quill_core::action::{ActionDescriptor, FieldCategory};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /api/v1/actions`.
#[derive(Debug, Deserialize)]
pub struct ListActionsQuery {
    /// Restrict to actions offered on this field category.
    pub category: Option<FieldCategory>,
}

/// GET /api/v1/actions
///
/// List registered actions in registration order, optionally filtered by
/// the field category they are offered on.
pub async fn list_actions(
    State(state): State<AppState>,
    Query(params): Query<ListActionsQuery>,
) -> AppResult<impl IntoResponse> {
    let actions: Vec<ActionDescriptor> = state
        .catalog
        .descriptors()
        .filter(|d| match params.category {
            Some(category) => d.field_categories.contains(&category),
            None => true,
        })
        .cloned()
        .collect();

    Ok(Json(DataResponse { data: actions }))
}
