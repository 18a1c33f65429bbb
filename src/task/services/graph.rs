//! Async task graph service: the entry point used by request handlers.

use super::{
    AssignmentStore, DependencyStore, OperationStore, TaskLifecycle, replace_assignments_in,
    set_dependencies_in,
};
use crate::identity::domain::{AgentId, TeamId};
use crate::notification::services::Dispatcher;
use crate::task::{
    domain::{Operation, OperationId, OperationRecord, Task, TaskId, TaskRef, TaskView, Zone},
    ports::{TaskGraphError, TaskGraphResult, TaskGraphStore},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// What to announce once a mutation has committed.
enum Notice {
    Assigned(Vec<AgentId>),
    Status,
    MapChange(&'static str),
}

/// Task graph operations with post-commit notification.
///
/// Store work runs on the blocking thread pool. When a [`Dispatcher`] is
/// attached, each committed mutation is announced; notification failures
/// are logged and never fail the mutation. A crash between commit and
/// dispatch loses the notification.
pub struct TaskGraphService<S> {
    store: Arc<S>,
    dispatcher: Option<Arc<Dispatcher>>,
}

impl<S> Clone for TaskGraphService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S> std::fmt::Debug for TaskGraphService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraphService")
            .field("notifies", &self.dispatcher.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: TaskGraphStore> TaskGraphService<S> {
    /// Creates a service that does not notify.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            dispatcher: None,
        }
    }

    /// Attaches a dispatcher for post-commit notifications.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskGraphResult<T>
    where
        F: FnOnce(Arc<S>) -> TaskGraphResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(TaskGraphError::persistence)?
    }

    /// Imports an operation with its tasks, dependencies and assignments.
    ///
    /// # Errors
    ///
    /// See [`OperationStore::create_operation`].
    pub async fn create_operation(
        &self,
        record: OperationRecord,
        tasks: Vec<TaskView>,
    ) -> TaskGraphResult<Operation> {
        let operation = self
            .run_blocking(move |store| OperationStore::new(store).create_operation(record, tasks))
            .await?;
        self.announce_map_change(operation.id(), operation.record().teams(), "created")
            .await;
        Ok(operation)
    }

    /// Loads a fully materialised operation.
    ///
    /// # Errors
    ///
    /// See [`OperationStore::load_operation`].
    pub async fn load_operation(&self, operation: &OperationId) -> TaskGraphResult<Operation> {
        let id = operation.clone();
        self.run_blocking(move |store| OperationStore::new(store).load_operation(&id))
            .await
    }

    /// Finds a task by reference.
    ///
    /// # Errors
    ///
    /// See [`OperationStore::get_task`].
    pub async fn get_task(&self, task: &TaskRef) -> TaskGraphResult<TaskView> {
        let target = task.clone();
        self.run_blocking(move |store| OperationStore::new(store).get_task(&target))
            .await
    }

    /// Finds the first task with `order` in an operation.
    ///
    /// # Errors
    ///
    /// See [`OperationStore::get_task_by_order`].
    pub async fn get_task_by_order(
        &self,
        operation: &OperationId,
        order: i16,
    ) -> TaskGraphResult<TaskView> {
        let id = operation.clone();
        self.run_blocking(move |store| OperationStore::new(store).get_task_by_order(&id, order))
            .await
    }

    /// Deletes an operation with everything it owns.
    ///
    /// # Errors
    ///
    /// See [`OperationStore::delete_operation`].
    pub async fn delete_operation(&self, operation: &OperationId) -> TaskGraphResult<bool> {
        let id = operation.clone();
        let (removed, teams) = self
            .run_blocking(move |store| {
                let teams = store.transaction(|tx| {
                    Ok(tx
                        .operation(&id)?
                        .map(|record| record.teams().to_vec())
                        .unwrap_or_default())
                })?;
                let removed = OperationStore::new(store).delete_operation(&id)?;
                Ok((removed, teams))
            })
            .await?;
        if removed {
            self.announce_map_change(operation, &teams, "deleted").await;
        }
        Ok(removed)
    }

    /// Deletes one task with its assignments and dependency edges.
    ///
    /// # Errors
    ///
    /// See [`OperationStore::delete_task`].
    pub async fn delete_task(&self, task: &TaskRef) -> TaskGraphResult<bool> {
        let target = task.clone();
        let (removed, teams) = self
            .run_blocking(move |store| {
                let teams = store.transaction(|tx| {
                    Ok(tx
                        .operation(target.operation())?
                        .map(|record| record.teams().to_vec())
                        .unwrap_or_default())
                })?;
                let removed = OperationStore::new(store).delete_task(&target)?;
                Ok((removed, teams))
            })
            .await?;
        if removed {
            self.announce_map_change(task.operation(), &teams, "task deleted")
                .await;
        }
        Ok(removed)
    }

    /// Replaces the dependency set of a task.
    ///
    /// # Errors
    ///
    /// See [`DependencyStore::set_dependencies`].
    pub async fn set_dependencies(
        &self,
        task: &TaskRef,
        dependencies: Vec<TaskId>,
    ) -> TaskGraphResult<Vec<TaskId>> {
        let target = task.clone();
        let written = self
            .run_blocking(move |store| {
                DependencyStore::new(store).set_dependencies(&target, &dependencies)
            })
            .await?;
        self.notify(task, Notice::MapChange("dependencies changed"))
            .await;
        Ok(written)
    }

    /// Lists the dependencies of a task.
    ///
    /// # Errors
    ///
    /// See [`DependencyStore::list_dependencies`].
    pub async fn list_dependencies(&self, task: &TaskRef) -> TaskGraphResult<Vec<TaskId>> {
        let target = task.clone();
        self.run_blocking(move |store| DependencyStore::new(store).list_dependencies(&target))
            .await
    }

    /// Adds one dependency edge.
    ///
    /// # Errors
    ///
    /// See [`DependencyStore::add_dependency`].
    pub async fn add_dependency(&self, task: &TaskRef, depends_on: &TaskId) -> TaskGraphResult<()> {
        let (target, edge) = (task.clone(), depends_on.clone());
        self.run_blocking(move |store| DependencyStore::new(store).add_dependency(&target, &edge))
            .await?;
        self.notify(task, Notice::MapChange("dependencies changed"))
            .await;
        Ok(())
    }

    /// Removes one dependency edge.
    ///
    /// # Errors
    ///
    /// See [`DependencyStore::remove_dependency`].
    pub async fn remove_dependency(
        &self,
        task: &TaskRef,
        depends_on: &TaskId,
    ) -> TaskGraphResult<bool> {
        let (target, edge) = (task.clone(), depends_on.clone());
        let removed = self
            .run_blocking(move |store| {
                DependencyStore::new(store).remove_dependency(&target, &edge)
            })
            .await?;
        if removed {
            self.notify(task, Notice::MapChange("dependencies changed"))
                .await;
        }
        Ok(removed)
    }

    /// Replaces the assignees of a task.
    ///
    /// # Errors
    ///
    /// See [`AssignmentStore::replace_assignments`].
    pub async fn replace_assignments(
        &self,
        task: &TaskRef,
        agents: Vec<AgentId>,
    ) -> TaskGraphResult<Vec<AgentId>> {
        let target = task.clone();
        let written = self
            .run_blocking(move |store| {
                AssignmentStore::new(store).replace_assignments(&target, &agents)
            })
            .await?;
        if !written.is_empty() {
            self.notify(task, Notice::Assigned(written.clone())).await;
        }
        Ok(written)
    }

    /// Removes every assignee and resets the task to `pending`.
    ///
    /// # Errors
    ///
    /// See [`AssignmentStore::clear_assignments`].
    pub async fn clear_assignments(&self, task: &TaskRef) -> TaskGraphResult<()> {
        let target = task.clone();
        self.run_blocking(move |store| AssignmentStore::new(store).clear_assignments(&target))
            .await?;
        self.notify(task, Notice::Status).await;
        Ok(())
    }

    /// Adds an assignee without disturbing existing ones.
    ///
    /// # Errors
    ///
    /// See [`AssignmentStore::claim`].
    pub async fn claim(&self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
        let (target, claimant) = (task.clone(), agent.clone());
        self.run_blocking(move |store| AssignmentStore::new(store).claim(&target, &claimant))
            .await?;
        self.notify(task, Notice::Assigned(vec![agent.clone()]))
            .await;
        Ok(())
    }

    /// Removes one assignee and resets the task to `pending`.
    ///
    /// # Errors
    ///
    /// See [`AssignmentStore::reject`].
    pub async fn reject(&self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
        let (target, rejecting) = (task.clone(), agent.clone());
        self.run_blocking(move |store| AssignmentStore::new(store).reject(&target, &rejecting))
            .await?;
        self.notify(task, Notice::Status).await;
        Ok(())
    }

    /// Reports whether `agent` is assigned to the task.
    ///
    /// # Errors
    ///
    /// See [`AssignmentStore::is_assigned_to`].
    pub async fn is_assigned_to(&self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool> {
        let (target, candidate) = (task.clone(), agent.clone());
        self.run_blocking(move |store| {
            AssignmentStore::new(store).is_assigned_to(&target, &candidate)
        })
        .await
    }

    /// Lists the assignees of a task.
    ///
    /// # Errors
    ///
    /// See [`AssignmentStore::list_assignments`].
    pub async fn list_assignments(&self, task: &TaskRef) -> TaskGraphResult<Vec<AgentId>> {
        let target = task.clone();
        self.run_blocking(move |store| AssignmentStore::new(store).list_assignments(&target))
            .await
    }

    /// Replaces the assignees and the dependency set of a task in one
    /// transaction. Either both sets change or neither does.
    ///
    /// # Errors
    ///
    /// Returns the first validation or storage error; the transaction is
    /// rolled back.
    pub async fn update_task_graph(
        &self,
        task: &TaskRef,
        agents: Vec<AgentId>,
        dependencies: Vec<TaskId>,
    ) -> TaskGraphResult<(Vec<AgentId>, Vec<TaskId>)> {
        let target = task.clone();
        let (assigned, depends_on) = self
            .run_blocking(move |store| {
                store.transaction(|tx| {
                    let depends_on = set_dependencies_in(tx, &target, &dependencies)?;
                    let assigned = replace_assignments_in(tx, &target, &agents)?;
                    Ok((assigned, depends_on))
                })
            })
            .await?;
        let notice = if assigned.is_empty() {
            Notice::MapChange("dependencies changed")
        } else {
            Notice::Assigned(assigned.clone())
        };
        self.notify(task, notice).await;
        Ok((assigned, depends_on))
    }

    /// Marks the task `acknowledged`.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::acknowledge`].
    pub async fn acknowledge(&self, task: &TaskRef) -> TaskGraphResult<Task> {
        self.lifecycle(task, |lifecycle, target| lifecycle.acknowledge(target))
            .await
    }

    /// Marks the task `completed`.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::complete`].
    pub async fn complete(&self, task: &TaskRef) -> TaskGraphResult<Task> {
        self.lifecycle(task, |lifecycle, target| lifecycle.complete(target))
            .await
    }

    /// Returns a completed task to `assigned`.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::incomplete`].
    pub async fn incomplete(&self, task: &TaskRef) -> TaskGraphResult<Task> {
        self.lifecycle(task, |lifecycle, target| lifecycle.incomplete(target))
            .await
    }

    /// Sets or clears the task comment.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::set_comment`].
    pub async fn set_comment(&self, task: &TaskRef, comment: String) -> TaskGraphResult<Task> {
        self.edit(task, move |lifecycle, target| {
            lifecycle.set_comment(target, &comment)
        })
        .await
    }

    /// Moves the task to another zone.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::set_zone`].
    pub async fn set_zone(&self, task: &TaskRef, zone: Zone) -> TaskGraphResult<Task> {
        self.edit(task, move |lifecycle, target| lifecycle.set_zone(target, zone))
            .await
    }

    /// Sets the display order of the task.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::set_order`].
    pub async fn set_order(&self, task: &TaskRef, order: i16) -> TaskGraphResult<Task> {
        self.edit(task, move |lifecycle, target| lifecycle.set_order(target, order))
            .await
    }

    /// Sets the delay after the previous task, in minutes.
    ///
    /// # Errors
    ///
    /// See [`TaskLifecycle::set_delta_minutes`].
    pub async fn set_delta_minutes(
        &self,
        task: &TaskRef,
        delta_minutes: i32,
    ) -> TaskGraphResult<Task> {
        self.edit(task, move |lifecycle, target| {
            lifecycle.set_delta_minutes(target, delta_minutes)
        })
        .await
    }

    async fn lifecycle<F>(&self, task: &TaskRef, f: F) -> TaskGraphResult<Task>
    where
        F: FnOnce(&TaskLifecycle<S>, &TaskRef) -> TaskGraphResult<Task> + Send + 'static,
    {
        let target = task.clone();
        let row = self
            .run_blocking(move |store| f(&TaskLifecycle::new(store), &target))
            .await?;
        self.notify(task, Notice::Status).await;
        Ok(row)
    }

    async fn edit<F>(&self, task: &TaskRef, f: F) -> TaskGraphResult<Task>
    where
        F: FnOnce(&TaskLifecycle<S>, &TaskRef) -> TaskGraphResult<Task> + Send + 'static,
    {
        let target = task.clone();
        let row = self
            .run_blocking(move |store| f(&TaskLifecycle::new(store), &target))
            .await?;
        self.notify(task, Notice::MapChange("task details changed"))
            .await;
        Ok(row)
    }

    async fn notify(&self, task: &TaskRef, notice: Notice) {
        let Some(dispatcher) = self.dispatcher.as_deref() else {
            return;
        };
        let target = task.clone();
        let context = self
            .run_blocking(move |store| {
                store.transaction(|tx| {
                    let Some(row) = tx.task(&target)? else {
                        return Ok(None);
                    };
                    let teams = tx
                        .operation(target.operation())?
                        .map(|record| record.teams().to_vec())
                        .unwrap_or_default();
                    Ok(Some((row, teams)))
                })
            })
            .await;
        let (row, teams) = match context {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!(task = %task, "task gone before notification");
                return;
            }
            Err(err) => {
                warn!(task = %task, error = %err, "skipping notification");
                return;
            }
        };

        match notice {
            Notice::Assigned(agents) => {
                for agent in &agents {
                    dispatcher.task_assigned(&row, agent).await;
                }
                dispatcher.task_status_changed(&row, &teams).await;
            }
            Notice::Status => {
                dispatcher.task_status_changed(&row, &teams).await;
            }
            Notice::MapChange(message) => {
                dispatcher.map_changed(row.operation(), &teams, message).await;
            }
        }
    }

    async fn announce_map_change(
        &self,
        operation: &OperationId,
        teams: &[TeamId],
        message: &str,
    ) {
        if let Some(dispatcher) = self.dispatcher.as_deref() {
            dispatcher.map_changed(operation, teams, message).await;
        }
    }
}
