//! Application services for the task graph.
//!
//! The stores in this module are synchronous and run each call in its own
//! transaction. The `*_in` functions perform the same work inside a
//! caller-supplied [`GraphTransaction`] so composite operations can share
//! one transaction. [`TaskGraphService`] is the async entry point that
//! offloads store work to the blocking pool and notifies after commit.

mod assignments;
mod dependencies;
mod graph;
mod lifecycle;
mod operations;

pub use assignments::{
    AssignmentStore, clear_assignments_in, precache_assignments_in, replace_assignments_in,
};
pub use dependencies::{DependencyStore, precache_dependencies_in, set_dependencies_in};
pub use graph::TaskGraphService;
pub use lifecycle::{TaskLifecycle, transition_in};
pub use operations::{OperationStore, load_operation_in};

use crate::task::{
    domain::{Task, TaskRef},
    ports::{GraphTransaction, TaskGraphError, TaskGraphResult},
};

fn require_task(tx: &mut dyn GraphTransaction, task: &TaskRef) -> TaskGraphResult<Task> {
    tx.task(task)?
        .ok_or_else(|| TaskGraphError::TaskNotFound(task.clone()))
}
