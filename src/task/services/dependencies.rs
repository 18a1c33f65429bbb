//! Dependency store: replace-all writes and bulk reads of dependency edges.

use super::require_task;
use crate::task::{
    domain::{DependencyGraph, OperationId, TaskId, TaskRef},
    ports::{GraphTransaction, TaskGraphResult, TaskGraphStore},
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Reads and writes a task's `depends_on` set.
#[derive(Debug)]
pub struct DependencyStore<S> {
    store: Arc<S>,
}

impl<S> Clone for DependencyStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskGraphStore> DependencyStore<S> {
    /// Creates a dependency store over a task graph store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Replaces the full dependency set of `task` in its own transaction.
    ///
    /// Returns the set as written (duplicates collapsed).
    ///
    /// # Errors
    ///
    /// Returns validation errors before any row changes, or the storage
    /// error that aborted the transaction.
    pub fn set_dependencies(
        &self,
        task: &TaskRef,
        dependencies: &[TaskId],
    ) -> TaskGraphResult<Vec<TaskId>> {
        self.store
            .transaction(|tx| set_dependencies_in(tx, task, dependencies))
    }

    /// Lists the dependencies of `task` in the order they were written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::task::ports::TaskGraphError::TaskNotFound`] when the
    /// task does not exist.
    pub fn list_dependencies(&self, task: &TaskRef) -> TaskGraphResult<Vec<TaskId>> {
        self.store.transaction(|tx| {
            require_task(tx, task)?;
            tx.dependencies(task)
        })
    }

    /// Adds a single dependency edge, keeping the existing ones.
    ///
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as [`Self::set_dependencies`].
    pub fn add_dependency(&self, task: &TaskRef, depends_on: &TaskId) -> TaskGraphResult<()> {
        self.store.transaction(|tx| {
            tx.lock_operation(task.operation())?;
            let mut current = tx.dependencies(task)?;
            if current.contains(depends_on) {
                return Ok(());
            }
            current.push(depends_on.clone());
            validate(tx, task, &current)?;
            tx.insert_dependency(task, depends_on)
        })
    }

    /// Removes a single dependency edge. Returns `false` when it was absent.
    ///
    /// # Errors
    ///
    /// Returns the storage error that aborted the transaction.
    pub fn remove_dependency(&self, task: &TaskRef, depends_on: &TaskId) -> TaskGraphResult<bool> {
        self.store
            .transaction(|tx| tx.delete_dependency(task, depends_on))
    }

    /// Loads every dependency edge of an operation in one query, keyed by
    /// dependent task.
    ///
    /// # Errors
    ///
    /// Returns the storage error from the bulk query.
    pub fn precache_dependencies(
        &self,
        operation: &OperationId,
    ) -> TaskGraphResult<HashMap<TaskId, Vec<TaskId>>> {
        self.store
            .transaction(|tx| precache_dependencies_in(tx, operation))
    }
}

/// Replaces the dependency set of `task` inside a caller-supplied
/// transaction: delete all, then insert all.
///
/// # Errors
///
/// Returns [`crate::task::ports::TaskGraphError::TaskNotFound`] for a missing
/// task, a domain validation error for self, unknown or cyclic edges, or the
/// storage error of the failing write.
pub fn set_dependencies_in(
    tx: &mut dyn GraphTransaction,
    task: &TaskRef,
    dependencies: &[TaskId],
) -> TaskGraphResult<Vec<TaskId>> {
    let accepted = validate(tx, task, dependencies)?;
    tx.delete_dependencies(task)?;
    for depends_on in &accepted {
        tx.insert_dependency(task, depends_on)?;
    }
    debug!(task = %task, count = accepted.len(), "dependencies replaced");
    Ok(accepted)
}

/// Bulk-loads an operation's dependency edges inside a transaction.
///
/// # Errors
///
/// Returns the storage error from the bulk query.
pub fn precache_dependencies_in(
    tx: &mut dyn GraphTransaction,
    operation: &OperationId,
) -> TaskGraphResult<HashMap<TaskId, Vec<TaskId>>> {
    let mut cache: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for (task, depends_on) in tx.operation_dependencies(operation)? {
        cache.entry(task).or_default().push(depends_on);
    }
    Ok(cache)
}

fn validate(
    tx: &mut dyn GraphTransaction,
    task: &TaskRef,
    proposed: &[TaskId],
) -> TaskGraphResult<Vec<TaskId>> {
    tx.lock_operation(task.operation())?;
    require_task(tx, task)?;
    let known: HashSet<TaskId> = tx
        .tasks(task.operation())?
        .into_iter()
        .map(|row| row.id().clone())
        .collect();
    let graph = DependencyGraph::from_edges(tx.operation_dependencies(task.operation())?);
    Ok(graph.validate_replacement(task, proposed, &known)?)
}
