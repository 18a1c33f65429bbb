//! Write-time validation of dependency edges within one operation.

use super::{TaskDomainError, TaskId, TaskRef};
use std::collections::{HashMap, HashSet};

/// Adjacency view of an operation's `task → depends_on` edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    /// Builds a graph from `(task, depends_on)` edge pairs.
    #[must_use]
    pub fn from_edges(edges: impl IntoIterator<Item = (TaskId, TaskId)>) -> Self {
        let mut graph = Self::default();
        for (task, depends_on) in edges {
            graph.edges.entry(task).or_default().push(depends_on);
        }
        graph
    }

    /// Validates a replacement dependency set for `task` and returns it with
    /// duplicates removed, first occurrence kept.
    ///
    /// `known_tasks` is the set of task ids in the operation. The task's
    /// current edges are ignored, since the write replaces them.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`],
    /// [`TaskDomainError::UnknownDependency`] or
    /// [`TaskDomainError::DependencyCycle`].
    pub fn validate_replacement(
        &self,
        task: &TaskRef,
        proposed: &[TaskId],
        known_tasks: &HashSet<TaskId>,
    ) -> Result<Vec<TaskId>, TaskDomainError> {
        let mut accepted: Vec<TaskId> = Vec::with_capacity(proposed.len());
        for depends_on in proposed {
            if depends_on == task.task() {
                return Err(TaskDomainError::SelfDependency(task.clone()));
            }
            if !known_tasks.contains(depends_on) {
                return Err(TaskDomainError::UnknownDependency {
                    task: task.clone(),
                    depends_on: depends_on.clone(),
                });
            }
            if self.reaches(depends_on, task.task()) {
                return Err(TaskDomainError::DependencyCycle {
                    task: task.clone(),
                    depends_on: depends_on.clone(),
                });
            }
            if !accepted.contains(depends_on) {
                accepted.push(depends_on.clone());
            }
        }
        Ok(accepted)
    }

    /// Returns `true` when `target` is reachable from `start` by following
    /// dependency edges, ignoring edges leaving `target` itself.
    fn reaches(&self, start: &TaskId, target: &TaskId) -> bool {
        let mut stack = vec![start];
        let mut seen: HashSet<&TaskId> = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = self.edges.get(current) {
                stack.extend(next.iter());
            }
        }
        false
    }
}
