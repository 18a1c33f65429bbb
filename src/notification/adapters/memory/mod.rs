//! In-memory channel adapter for tests and local runs.

mod recording;

pub use recording::{RecordedCall, RecordingChannel};
