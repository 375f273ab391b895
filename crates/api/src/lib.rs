//! HTTP surface for the Quill AI-action engine.
//!
//! Exposes submit, job polling, batch polling, and catalog listing over
//! JSON, and wires the engine together: store, worker pool, dispatcher,
//! and the TTL retention task.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
