//! Adapter implementations for task graph persistence.

pub mod memory;
pub mod postgres;
