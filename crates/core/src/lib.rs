//! Pure domain types and logic for the Quill AI-action engine.
//!
//! This crate holds everything that can be expressed without an async
//! runtime or I/O: the action catalog, MIME format matching, the job
//! state machine, batch status derivation, and the error taxonomy.
//! Execution, storage, and the HTTP surface live in the `quill-store`,
//! `quill-engine`, and `quill-api` crates.

pub mod action;
pub mod batch;
pub mod builtin;
pub mod catalog;
pub mod error;
pub mod job;
pub mod mime;
pub mod target;
pub mod types;

pub use error::CoreError;
