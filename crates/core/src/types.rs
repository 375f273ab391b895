/// Jobs and batches are identified by opaque UUIDs, never by sequence.
pub type JobId = uuid::Uuid;

/// Batch identifier, same shape as [`JobId`] but never interchangeable
/// in store keys (jobs and batches live in separate keyspaces).
pub type BatchId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
