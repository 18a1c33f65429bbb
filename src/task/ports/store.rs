//! Transactional storage port for tasks, dependency edges and assignments.
//!
//! The port mirrors a SQL-style `begin → exec/query → commit | rollback`
//! interface. [`TaskGraphStore::transaction`] opens a transaction, hands the
//! closure a [`GraphTransaction`], commits when the closure returns `Ok` and
//! rolls back otherwise. Higher-level operations that must be atomic
//! together run inside one closure and pass the same transaction through.

use crate::identity::domain::AgentId;
use crate::task::domain::{
    OperationId, OperationRecord, Task, TaskDomainError, TaskId, TaskRef, TaskState,
};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task graph storage operations.
pub type TaskGraphResult<T> = Result<T, TaskGraphError>;

/// Storage engine able to run a closure inside one transaction.
pub trait TaskGraphStore: Send + Sync + 'static {
    /// Runs `f` inside a transaction.
    ///
    /// Every write performed through the transaction becomes visible
    /// atomically when `f` returns `Ok`; none persist when it returns `Err`.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or [`TaskGraphError::Persistence`] when
    /// the transaction cannot be opened or committed.
    fn transaction<T, F>(&self, f: F) -> TaskGraphResult<T>
    where
        F: FnOnce(&mut dyn GraphTransaction) -> TaskGraphResult<T>;
}

/// Row-level operations available inside an open transaction.
pub trait GraphTransaction {
    /// Inserts an operation header and its team shares.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::DuplicateOperation`] when the id exists.
    fn insert_operation(&mut self, record: &OperationRecord) -> TaskGraphResult<()>;

    /// Loads an operation header.
    fn operation(&mut self, id: &OperationId) -> TaskGraphResult<Option<OperationRecord>>;

    /// Locks the operation header row until the transaction ends.
    ///
    /// Dependency validation reads the whole graph of an operation before
    /// writing an edge; writers that validate under this lock cannot both
    /// pass the cycle check with opposite edges. A missing operation takes no
    /// lock and is not an error.
    fn lock_operation(&mut self, id: &OperationId) -> TaskGraphResult<()>;

    /// Deletes an operation together with its tasks, dependency edges and
    /// assignments. Returns `false` when the operation did not exist.
    fn delete_operation(&mut self, id: &OperationId) -> TaskGraphResult<bool>;

    /// Inserts a task row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::DuplicateTask`] when the id exists in the
    /// operation, or [`TaskGraphError::OperationNotFound`] when the owning
    /// operation does not exist.
    fn insert_task(&mut self, task: &Task) -> TaskGraphResult<()>;

    /// Loads a task row.
    fn task(&mut self, task: &TaskRef) -> TaskGraphResult<Option<Task>>;

    /// Loads every task row of an operation.
    fn tasks(&mut self, operation: &OperationId) -> TaskGraphResult<Vec<Task>>;

    /// Overwrites the scalar columns (state, order, zone, delta, comment) of
    /// an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::TaskNotFound`] when the task does not exist.
    fn update_task(&mut self, task: &Task) -> TaskGraphResult<()>;

    /// Sets the lifecycle state of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::TaskNotFound`] when the task does not exist.
    fn set_state(&mut self, task: &TaskRef, state: TaskState) -> TaskGraphResult<()>;

    /// Deletes a task with its dependency edges (in both directions) and
    /// assignments. Returns `false` when the task did not exist.
    fn delete_task(&mut self, task: &TaskRef) -> TaskGraphResult<bool>;

    /// Deletes every dependency edge leaving `task`.
    fn delete_dependencies(&mut self, task: &TaskRef) -> TaskGraphResult<()>;

    /// Inserts one `task → depends_on` edge.
    fn insert_dependency(&mut self, task: &TaskRef, depends_on: &TaskId) -> TaskGraphResult<()>;

    /// Deletes one `task → depends_on` edge. Returns `false` when absent.
    fn delete_dependency(&mut self, task: &TaskRef, depends_on: &TaskId)
    -> TaskGraphResult<bool>;

    /// Lists the dependencies of `task` in insertion order.
    fn dependencies(&mut self, task: &TaskRef) -> TaskGraphResult<Vec<TaskId>>;

    /// Lists every `(task, depends_on)` edge of an operation in one query.
    fn operation_dependencies(
        &mut self,
        operation: &OperationId,
    ) -> TaskGraphResult<Vec<(TaskId, TaskId)>>;

    /// Deletes every assignment row of `task`.
    fn delete_assignments(&mut self, task: &TaskRef) -> TaskGraphResult<()>;

    /// Inserts one assignment row. Inserting an existing `(task, agent)`
    /// pair is a no-op.
    fn insert_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()>;

    /// Deletes one assignment row. Returns `false` when absent.
    fn delete_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool>;

    /// Lists the assignees of `task` in insertion order.
    fn assignments(&mut self, task: &TaskRef) -> TaskGraphResult<Vec<AgentId>>;

    /// Reports whether `agent` is assigned to `task`.
    fn has_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool>;

    /// Lists every `(task, agent)` assignment of an operation in one query.
    fn operation_assignments(
        &mut self,
        operation: &OperationId,
    ) -> TaskGraphResult<Vec<(TaskId, AgentId)>>;
}

/// Errors returned by task graph stores and services.
#[derive(Debug, Clone, Error)]
pub enum TaskGraphError {
    /// An operation with the same identifier already exists.
    #[error("duplicate operation identifier: {0}")]
    DuplicateOperation(OperationId),

    /// A task with the same identifier already exists in the operation.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskRef),

    /// The operation was not found.
    #[error("operation not found: {0}")]
    OperationNotFound(OperationId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskRef),

    /// The agent holds no assignment on the task.
    #[error("agent {agent} is not assigned to task {task}")]
    NotAssigned {
        /// Task that was addressed.
        task: TaskRef,
        /// Agent that was expected to be assigned.
        agent: AgentId,
    },

    /// Domain validation rejected the write before any row changed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskGraphError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
