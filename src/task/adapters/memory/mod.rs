//! In-memory task graph storage.

mod store;

pub use store::InMemoryTaskGraphStore;
