//! Execution engine for Quill AI actions.
//!
//! The dispatcher is the single orchestration entry point: it validates
//! eligibility, resolves required context, writes the initial job record,
//! and hands the unit of work to an execution channel — a queue consumed
//! by the worker pool, or inline for synchronous callers. Workers call
//! the generation backend and write terminal state back into the job
//! store. The batch aggregator derives batch status from member jobs on
//! every read and never caches it.

pub mod aggregator;
pub mod backend;
pub mod context;
pub mod dispatcher;
pub mod eligibility;
pub mod render;
pub mod worker;

pub use aggregator::{BatchAggregator, BatchView};
pub use backend::{BackendError, GenerationBackend, GenerationRequest};
pub use dispatcher::{
    BatchDispatchReport, DispatchRequest, Dispatched, Dispatcher, ExecutionMode, ModelConfig,
};
pub use worker::{WorkUnit, Worker, WorkerPool};
