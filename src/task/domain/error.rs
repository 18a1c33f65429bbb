//! Error types for task domain validation and lookup.

use super::{OperationId, TaskId, TaskRef};
use thiserror::Error;

/// Errors returned while constructing or querying task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The operation identifier is empty after trimming.
    #[error("operation identifier must not be empty")]
    EmptyOperationId,

    /// The operation identifier exceeds the 64-character limit.
    #[error("operation identifier exceeds 64 character limit: {0}")]
    OperationIdTooLong(String),

    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The task identifier exceeds the 64-character limit.
    #[error("task identifier exceeds 64 character limit: {0}")]
    TaskIdTooLong(String),

    /// No task with the identifier exists in the operation.
    #[error("task not found: {0}")]
    TaskNotFound(TaskRef),

    /// No task in the operation carries the requested order.
    #[error("no task with order {order} in operation {operation}")]
    NoTaskAtOrder {
        /// Operation that was searched.
        operation: OperationId,
        /// Requested order value.
        order: i16,
    },

    /// An imported task names a different operation than the one being
    /// imported.
    #[error("task {task} does not belong to operation {operation}")]
    ForeignTask {
        /// Offending task.
        task: TaskRef,
        /// Operation being imported.
        operation: OperationId,
    },

    /// A task was asked to depend on itself.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskRef),

    /// A dependency names a task outside the operation.
    #[error("task {task} depends on {depends_on}, which is not a task of the same operation")]
    UnknownDependency {
        /// Task whose dependency set was being written.
        task: TaskRef,
        /// Offending dependency target.
        depends_on: TaskId,
    },

    /// Writing the dependency would close a cycle in the operation graph.
    #[error("dependency {task} -> {depends_on} would create a cycle")]
    DependencyCycle {
        /// Task whose dependency set was being written.
        task: TaskRef,
        /// Dependency target that leads back to the task.
        depends_on: TaskId,
    },
}

/// Error returned while parsing task states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseTaskStateError(pub String);

/// Error returned while parsing task kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task kind: {0}")]
pub struct ParseTaskKindError(pub String);
