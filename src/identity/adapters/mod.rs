//! Adapter implementations for identity lookups.

pub mod memory;
