pub mod actions;
pub mod batches;
pub mod jobs;
