//! Operation import, materialisation and removal.

use super::{
    assignments::{precache_assignments_in, replace_assignments_in},
    dependencies::{precache_dependencies_in, set_dependencies_in},
};
use crate::task::{
    domain::{Operation, OperationId, OperationRecord, TaskDomainError, TaskRef, TaskView},
    ports::{GraphTransaction, TaskGraphError, TaskGraphResult, TaskGraphStore},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Imports, loads and deletes whole operations.
#[derive(Debug)]
pub struct OperationStore<S> {
    store: Arc<S>,
}

impl<S> Clone for OperationStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskGraphStore> OperationStore<S> {
    /// Creates an operation store over a task graph store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Imports an operation with its tasks, dependencies and assignments in
    /// one transaction and returns the materialised result.
    ///
    /// All task rows are written before any dependency so tasks may depend
    /// on tasks listed after them.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::DuplicateOperation`] or
    /// [`TaskGraphError::DuplicateTask`] on conflicting ids,
    /// [`TaskDomainError::ForeignTask`] when a task belongs to another
    /// operation, a domain error for invalid dependencies, or the storage
    /// error that aborted the import. Nothing is persisted on failure.
    pub fn create_operation(
        &self,
        record: OperationRecord,
        tasks: Vec<TaskView>,
    ) -> TaskGraphResult<Operation> {
        if let Some(foreign) = tasks
            .iter()
            .find(|view| view.task().operation() != record.id())
        {
            return Err(TaskDomainError::ForeignTask {
                task: foreign.task().task_ref().clone(),
                operation: record.id().clone(),
            }
            .into());
        }
        let operation = self.store.transaction(|tx| {
            tx.insert_operation(&record)?;
            for view in &tasks {
                tx.insert_task(view.task())?;
            }
            for view in &tasks {
                let task = view.task().task_ref();
                if !view.depends_on().is_empty() {
                    set_dependencies_in(tx, task, view.depends_on())?;
                }
                if !view.assignments().is_empty() {
                    replace_assignments_in(tx, task, view.assignments())?;
                }
            }
            load_operation_in(tx, record.id())
        })?;
        info!(
            operation = %operation.id(),
            tasks = operation.tasks().len(),
            "operation imported"
        );
        Ok(operation)
    }

    /// Loads the operation with every task, assignment and dependency.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::OperationNotFound`] when the operation does
    /// not exist.
    pub fn load_operation(&self, operation: &OperationId) -> TaskGraphResult<Operation> {
        self.store
            .transaction(|tx| load_operation_in(tx, operation))
    }

    /// Finds one task view by reference, scanning the materialised
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::OperationNotFound`] or
    /// [`TaskGraphError::TaskNotFound`].
    pub fn get_task(&self, task: &TaskRef) -> TaskGraphResult<TaskView> {
        let operation = self.load_operation(task.operation())?;
        let view = operation.get_task(task.task()).map_err(lift_not_found)?;
        Ok(view.clone())
    }

    /// Finds the first task carrying `order` in the operation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::OperationNotFound`] or a
    /// [`TaskDomainError::NoTaskAtOrder`] domain error.
    pub fn get_task_by_order(
        &self,
        operation: &OperationId,
        order: i16,
    ) -> TaskGraphResult<TaskView> {
        let loaded = self.load_operation(operation)?;
        let view = loaded.get_task_by_order(order)?;
        Ok(view.clone())
    }

    /// Deletes an operation and everything it owns. Returns `false` when the
    /// operation did not exist.
    ///
    /// # Errors
    ///
    /// Returns the storage error that aborted the transaction.
    pub fn delete_operation(&self, operation: &OperationId) -> TaskGraphResult<bool> {
        let removed = self
            .store
            .transaction(|tx| tx.delete_operation(operation))?;
        debug!(operation = %operation, removed, "operation delete");
        Ok(removed)
    }

    /// Deletes one task with its assignments and every dependency edge that
    /// touches it. Returns `false` when the task did not exist.
    ///
    /// # Errors
    ///
    /// Returns the storage error that aborted the transaction.
    pub fn delete_task(&self, task: &TaskRef) -> TaskGraphResult<bool> {
        let removed = self.store.transaction(|tx| tx.delete_task(task))?;
        debug!(task = %task, removed, "task delete");
        Ok(removed)
    }
}

/// Materialises an operation inside a caller-supplied transaction using the
/// two bulk precache queries.
///
/// # Errors
///
/// Returns [`TaskGraphError::OperationNotFound`] when the operation does not
/// exist, or the storage error of a query.
pub fn load_operation_in(
    tx: &mut dyn GraphTransaction,
    operation: &OperationId,
) -> TaskGraphResult<Operation> {
    let record = tx
        .operation(operation)?
        .ok_or_else(|| TaskGraphError::OperationNotFound(operation.clone()))?;
    let tasks = tx.tasks(operation)?;
    let assignments = precache_assignments_in(tx, operation)?;
    let dependencies = precache_dependencies_in(tx, operation)?;
    Ok(Operation::assemble(record, tasks, assignments, dependencies))
}

fn lift_not_found(err: TaskDomainError) -> TaskGraphError {
    match err {
        TaskDomainError::TaskNotFound(task) => TaskGraphError::TaskNotFound(task),
        other => TaskGraphError::Domain(other),
    }
}
