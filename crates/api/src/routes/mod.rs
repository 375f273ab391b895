pub mod actions;
pub mod batches;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /actions                     list registered actions
///
/// /jobs                        submit one action execution
/// /jobs/{id}                   poll job status
///
/// /batches                     submit one action across many targets
/// /batches/{id}                poll derived batch status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/actions", actions::router())
        .nest("/jobs", jobs::router())
        .nest("/batches", batches::router())
}
