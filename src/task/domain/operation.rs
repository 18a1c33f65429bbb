//! Operation aggregate and its materialized task views.

use super::{OperationId, Task, TaskDomainError, TaskId, TaskKind, TaskRef};
use crate::identity::domain::{AgentId, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operation header row: identity, display name and the teams it is shared
/// with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    id: OperationId,
    name: String,
    teams: Vec<TeamId>,
}

impl OperationRecord {
    /// Creates an operation record that is not yet shared with any team.
    #[must_use]
    pub fn new(id: OperationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            teams: Vec::new(),
        }
    }

    /// Sets the teams the operation is shared with. Duplicates are dropped.
    #[must_use]
    pub fn with_teams(mut self, teams: impl IntoIterator<Item = TeamId>) -> Self {
        self.teams.clear();
        for team in teams {
            if !self.teams.contains(&team) {
                self.teams.push(team);
            }
        }
        self
    }

    /// Returns the operation identifier.
    #[must_use]
    pub const fn id(&self) -> &OperationId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the teams the operation is shared with.
    #[must_use]
    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }
}

/// A task joined with its assignees and dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    task: Task,
    assignments: Vec<AgentId>,
    depends_on: Vec<TaskId>,
}

impl TaskView {
    /// Creates a view from its parts.
    #[must_use]
    pub const fn new(task: Task, assignments: Vec<AgentId>, depends_on: Vec<TaskId>) -> Self {
        Self {
            task,
            assignments,
            depends_on,
        }
    }

    /// Returns the task row.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the assigned agents.
    #[must_use]
    pub fn assignments(&self) -> &[AgentId] {
        &self.assignments
    }

    /// Returns the tasks this task depends on.
    #[must_use]
    pub fn depends_on(&self) -> &[TaskId] {
        &self.depends_on
    }

    /// Consumes the view and returns the task row.
    #[must_use]
    pub fn into_task(self) -> Task {
        self.task
    }
}

/// Operation aggregate: a header plus its ordered task list.
///
/// Tasks are held markers first, then links, each group in the order the
/// store returned them. Lookups scan in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    record: OperationRecord,
    tasks: Vec<TaskView>,
}

impl Operation {
    /// Materializes an operation from task rows and the two precached
    /// per-operation lookups.
    ///
    /// Tasks belonging to another operation are ignored.
    #[must_use]
    pub fn assemble<S: std::hash::BuildHasher>(
        record: OperationRecord,
        tasks: Vec<Task>,
        mut assignments: HashMap<TaskId, Vec<AgentId>, S>,
        mut dependencies: HashMap<TaskId, Vec<TaskId>, S>,
    ) -> Self {
        let (markers, links): (Vec<Task>, Vec<Task>) = tasks
            .into_iter()
            .filter(|task| task.operation() == record.id())
            .partition(|task| task.kind() == TaskKind::Marker);

        let views = markers
            .into_iter()
            .chain(links)
            .map(|task| {
                let assigned = assignments.remove(task.id()).unwrap_or_default();
                let depends_on = dependencies.remove(task.id()).unwrap_or_default();
                TaskView::new(task, assigned, depends_on)
            })
            .collect();

        Self {
            record,
            tasks: views,
        }
    }

    /// Returns the operation identifier.
    #[must_use]
    pub const fn id(&self) -> &OperationId {
        self.record.id()
    }

    /// Returns the operation header.
    #[must_use]
    pub const fn record(&self) -> &OperationRecord {
        &self.record
    }

    /// Returns every task view, markers first.
    #[must_use]
    pub fn tasks(&self) -> &[TaskView] {
        &self.tasks
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotFound`] when no task has the id.
    pub fn get_task(&self, id: &TaskId) -> Result<&TaskView, TaskDomainError> {
        self.tasks
            .iter()
            .find(|view| view.task().id() == id)
            .ok_or_else(|| TaskDomainError::TaskNotFound(TaskRef::new(self.id().clone(), id.clone())))
    }

    /// Finds the first task carrying the given order.
    ///
    /// Order values are not unique, so later tasks with the same order are
    /// unreachable through this lookup.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoTaskAtOrder`] when no task matches.
    pub fn get_task_by_order(&self, order: i16) -> Result<&TaskView, TaskDomainError> {
        self.tasks
            .iter()
            .find(|view| view.task().order() == order)
            .ok_or_else(|| TaskDomainError::NoTaskAtOrder {
                operation: self.id().clone(),
                order,
            })
    }
}
