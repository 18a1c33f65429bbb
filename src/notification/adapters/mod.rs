//! Channel adapter implementations.

pub mod memory;
pub mod push;
