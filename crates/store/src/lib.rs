//! Job and batch storage for the Quill engine.
//!
//! The engine never talks to a concrete storage backend; it goes through
//! the [`JobStore`] and [`BatchStore`] traits, which carry get/put/TTL
//! semantics. [`MemoryStore`] is the bundled concurrent in-memory
//! implementation used by the binary and by tests; a distributed cache
//! implementation can be swapped in without touching engine logic.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::{BatchStore, JobStore, StoreError};
