/// Domain-level error taxonomy shared across the engine and API crates.
///
/// Validation errors (`Ineligible`, `UnsupportedFormat`, `InvalidContext`)
/// are always surfaced synchronously before any job record is written.
/// `ExecutionFailed` only escapes on the synchronous dispatch path; on the
/// async path a backend failure is captured into the job record instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The action is not configured for the field, or the handle is unknown.
    #[error("Action not eligible: {0}")]
    Ineligible(String),

    /// The resolved asset's MIME type matches none of the accepted patterns.
    #[error("Unsupported format: {actual} (accepted: {})", accepted.join(", "))]
    UnsupportedFormat {
        actual: String,
        accepted: Vec<String>,
    },

    /// A declared context requirement could not be resolved from the target.
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    /// Job or batch id unknown, never existed or evicted past its TTL.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// An illegal state transition or conflicting write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Terminal failure surfaced by synchronous dispatch.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
