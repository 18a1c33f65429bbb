//! Domain model for operations, tasks and their dependency graph.
//!
//! Tasks are map markers or links owned by an operation. The domain keeps
//! lifecycle states, ordering metadata and dependency validation free of any
//! storage concerns.

mod dependency;
mod error;
mod ids;
mod operation;
mod task;

pub use dependency::DependencyGraph;
pub use error::{ParseTaskKindError, ParseTaskStateError, TaskDomainError};
pub use ids::{MAX_TASK_ID_LENGTH, OperationId, TaskId, TaskRef};
pub use operation::{Operation, OperationRecord, TaskView};
pub use task::{Task, TaskKind, TaskState, Zone};
