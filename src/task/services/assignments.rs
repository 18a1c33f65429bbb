//! Assignment store: which agents hold which task, kept in step with the
//! task's lifecycle state.

use super::require_task;
use crate::identity::domain::AgentId;
use crate::task::{
    domain::{OperationId, TaskId, TaskRef, TaskState},
    ports::{GraphTransaction, TaskGraphError, TaskGraphResult, TaskGraphStore},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Reads and writes a task's assignee set.
#[derive(Debug)]
pub struct AssignmentStore<S> {
    store: Arc<S>,
}

impl<S> Clone for AssignmentStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskGraphStore> AssignmentStore<S> {
    /// Creates an assignment store over a task graph store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Replaces every assignment of `task` in its own transaction.
    ///
    /// A non-empty list moves the task to `assigned`; an empty list only
    /// removes rows and leaves the state alone (use
    /// [`Self::clear_assignments`] to reset to `pending`). Returns the
    /// assignees as written, duplicates collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::TaskNotFound`] for a missing task or the
    /// storage error that aborted the transaction.
    pub fn replace_assignments(
        &self,
        task: &TaskRef,
        agents: &[AgentId],
    ) -> TaskGraphResult<Vec<AgentId>> {
        self.store
            .transaction(|tx| replace_assignments_in(tx, task, agents))
    }

    /// Deletes every assignment of `task` and resets it to `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::TaskNotFound`] for a missing task or the
    /// storage error that aborted the transaction.
    pub fn clear_assignments(&self, task: &TaskRef) -> TaskGraphResult<()> {
        self.store.transaction(|tx| clear_assignments_in(tx, task))
    }

    /// Adds `agent` to the assignees of `task` and marks it `assigned`,
    /// preserving other assignees. Claiming twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::TaskNotFound`] for a missing task or the
    /// storage error that aborted the transaction.
    pub fn claim(&self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
        self.store.transaction(|tx| claim_in(tx, task, agent))
    }

    /// Removes `agent` from the assignees of `task` and resets the task to
    /// `pending`, even when other assignees remain.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::NotAssigned`] without side effects when the
    /// agent holds no assignment on the task.
    pub fn reject(&self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
        self.store.transaction(|tx| reject_in(tx, task, agent))
    }

    /// Reports whether `agent` is assigned to `task`.
    ///
    /// # Errors
    ///
    /// Returns the storage error from the lookup.
    pub fn is_assigned_to(&self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool> {
        self.store.transaction(|tx| tx.has_assignment(task, agent))
    }

    /// Lists the assignees of `task`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::TaskNotFound`] for a missing task.
    pub fn list_assignments(&self, task: &TaskRef) -> TaskGraphResult<Vec<AgentId>> {
        self.store.transaction(|tx| {
            require_task(tx, task)?;
            tx.assignments(task)
        })
    }

    /// Loads every assignment of an operation in one query, keyed by task.
    ///
    /// # Errors
    ///
    /// Returns the storage error from the bulk query.
    pub fn precache_assignments(
        &self,
        operation: &OperationId,
    ) -> TaskGraphResult<HashMap<TaskId, Vec<AgentId>>> {
        self.store
            .transaction(|tx| precache_assignments_in(tx, operation))
    }
}

/// Replace-all assignment write inside a caller-supplied transaction.
///
/// # Errors
///
/// Returns [`TaskGraphError::TaskNotFound`] for a missing task or the storage
/// error of the failing write.
pub fn replace_assignments_in(
    tx: &mut dyn GraphTransaction,
    task: &TaskRef,
    agents: &[AgentId],
) -> TaskGraphResult<Vec<AgentId>> {
    require_task(tx, task)?;
    tx.delete_assignments(task)?;

    let mut written: Vec<AgentId> = Vec::with_capacity(agents.len());
    for agent in agents {
        if written.contains(agent) {
            continue;
        }
        tx.insert_assignment(task, agent)?;
        written.push(agent.clone());
    }

    if !written.is_empty() {
        tx.set_state(task, TaskState::Assigned)?;
    }
    debug!(task = %task, count = written.len(), "assignments replaced");
    Ok(written)
}

/// Deletes every assignment and resets the task to `pending` inside a
/// caller-supplied transaction.
///
/// # Errors
///
/// Returns [`TaskGraphError::TaskNotFound`] for a missing task or the storage
/// error of the failing write.
pub fn clear_assignments_in(tx: &mut dyn GraphTransaction, task: &TaskRef) -> TaskGraphResult<()> {
    require_task(tx, task)?;
    tx.delete_assignments(task)?;
    tx.set_state(task, TaskState::Pending)
}

fn claim_in(tx: &mut dyn GraphTransaction, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
    require_task(tx, task)?;
    if !tx.has_assignment(task, agent)? {
        tx.insert_assignment(task, agent)?;
    }
    tx.set_state(task, TaskState::Assigned)
}

fn reject_in(tx: &mut dyn GraphTransaction, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
    require_task(tx, task)?;
    if !tx.delete_assignment(task, agent)? {
        return Err(TaskGraphError::NotAssigned {
            task: task.clone(),
            agent: agent.clone(),
        });
    }
    tx.set_state(task, TaskState::Pending)
}

/// Bulk-loads an operation's assignments inside a transaction.
///
/// # Errors
///
/// Returns the storage error from the bulk query.
pub fn precache_assignments_in(
    tx: &mut dyn GraphTransaction,
    operation: &OperationId,
) -> TaskGraphResult<HashMap<TaskId, Vec<AgentId>>> {
    let mut cache: HashMap<TaskId, Vec<AgentId>> = HashMap::new();
    for (task, agent) in tx.operation_assignments(operation)? {
        cache.entry(task).or_default().push(agent);
    }
    Ok(cache)
}
