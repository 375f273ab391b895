use std::sync::Arc;

use quill_core::catalog::Catalog;
use quill_engine::{BatchAggregator, Dispatcher};
use quill_store::JobStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Compiled-in action catalog.
    pub catalog: Arc<Catalog>,
    /// Job store, read directly by the polling handlers.
    pub jobs: Arc<dyn JobStore>,
    /// Orchestration entry point for all dispatches.
    pub dispatcher: Arc<Dispatcher>,
    /// Batch creation and derived-status reads.
    pub aggregator: Arc<BatchAggregator>,
}
