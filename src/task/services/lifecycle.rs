//! Task state transitions and detail edits.

use super::require_task;
use crate::task::{
    domain::{Task, TaskRef, TaskState, Zone},
    ports::{GraphTransaction, TaskGraphResult, TaskGraphStore},
};
use std::sync::Arc;
use tracing::debug;

/// Moves tasks through their lifecycle and edits per-task details.
///
/// Transitions are unconditional writes: any state may move to any target,
/// matching how field agents report progress out of order.
#[derive(Debug)]
pub struct TaskLifecycle<S> {
    store: Arc<S>,
}

impl<S> Clone for TaskLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskGraphStore> TaskLifecycle<S> {
    /// Creates a lifecycle service over a task graph store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Marks the task `acknowledged`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::task::ports::TaskGraphError::TaskNotFound`] for a
    /// missing task or the storage error of the write.
    pub fn acknowledge(&self, task: &TaskRef) -> TaskGraphResult<Task> {
        self.transition(task, TaskState::Acknowledged)
    }

    /// Marks the task `completed`.
    ///
    /// # Errors
    ///
    /// See [`Self::acknowledge`].
    pub fn complete(&self, task: &TaskRef) -> TaskGraphResult<Task> {
        self.transition(task, TaskState::Completed)
    }

    /// Reopens a completed task by moving it back to `assigned`.
    ///
    /// # Errors
    ///
    /// See [`Self::acknowledge`].
    pub fn incomplete(&self, task: &TaskRef) -> TaskGraphResult<Task> {
        self.transition(task, TaskState::Assigned)
    }

    /// Sets or clears the free-text comment. Blank input clears it.
    ///
    /// # Errors
    ///
    /// See [`Self::acknowledge`].
    pub fn set_comment(&self, task: &TaskRef, comment: &str) -> TaskGraphResult<Task> {
        self.edit(task, |row| row.set_comment(comment))
    }

    /// Moves the task to another zone.
    ///
    /// # Errors
    ///
    /// See [`Self::acknowledge`].
    pub fn set_zone(&self, task: &TaskRef, zone: Zone) -> TaskGraphResult<Task> {
        self.edit(task, |row| row.set_zone(zone))
    }

    /// Sets the task's display order.
    ///
    /// # Errors
    ///
    /// See [`Self::acknowledge`].
    pub fn set_order(&self, task: &TaskRef, order: i16) -> TaskGraphResult<Task> {
        self.edit(task, |row| row.set_order(order))
    }

    /// Sets the minutes to wait after the previous task before starting.
    ///
    /// # Errors
    ///
    /// See [`Self::acknowledge`].
    pub fn set_delta_minutes(&self, task: &TaskRef, delta_minutes: i32) -> TaskGraphResult<Task> {
        self.edit(task, |row| row.set_delta_minutes(delta_minutes))
    }

    fn transition(&self, task: &TaskRef, state: TaskState) -> TaskGraphResult<Task> {
        self.store.transaction(|tx| transition_in(tx, task, state))
    }

    fn edit(&self, task: &TaskRef, apply: impl FnOnce(&mut Task)) -> TaskGraphResult<Task> {
        self.store.transaction(|tx| {
            let mut row = require_task(tx, task)?;
            apply(&mut row);
            tx.update_task(&row)?;
            Ok(row)
        })
    }
}

/// Writes a new lifecycle state inside a caller-supplied transaction and
/// returns the updated row.
///
/// # Errors
///
/// Returns [`crate::task::ports::TaskGraphError::TaskNotFound`] for a missing
/// task or the storage error of the write.
pub fn transition_in(
    tx: &mut dyn GraphTransaction,
    task: &TaskRef,
    state: TaskState,
) -> TaskGraphResult<Task> {
    let mut row = require_task(tx, task)?;
    tx.set_state(task, state)?;
    row.set_state(state);
    debug!(task = %task, state = %state, "task state written");
    Ok(row)
}
