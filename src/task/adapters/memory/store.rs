//! In-memory transactional store for task graph tests.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::identity::domain::AgentId;
use crate::task::{
    domain::{OperationId, OperationRecord, Task, TaskId, TaskRef, TaskState},
    ports::{GraphTransaction, TaskGraphError, TaskGraphResult, TaskGraphStore},
};

/// Thread-safe in-memory task graph store.
///
/// A transaction works on a private copy of the whole graph and swaps it in
/// on commit, so transactions are serialized and a failed closure leaves no
/// trace. Rows keep insertion order, matching what list queries return.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskGraphStore {
    state: Arc<Mutex<GraphState>>,
    injected_failure: Arc<Mutex<Option<usize>>>,
}

#[derive(Debug, Clone, Default)]
struct GraphState {
    operations: Vec<OperationRecord>,
    tasks: Vec<Task>,
    dependencies: Vec<(TaskRef, TaskId)>,
    assignments: Vec<(TaskRef, AgentId)>,
}

fn lock<T>(mutex: &Mutex<T>) -> TaskGraphResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|err| TaskGraphError::persistence(std::io::Error::other(err.to_string())))
}

impl InMemoryTaskGraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transaction fail on its write number `after + 1`.
    ///
    /// Writes before that point succeed inside the transaction and must be
    /// discarded by the rollback. The injection is consumed by the next
    /// transaction whether or not it reaches that many writes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGraphError::Persistence`] when lock acquisition fails.
    pub fn fail_next_transaction_after_writes(&self, after: usize) -> TaskGraphResult<()> {
        *lock(&self.injected_failure)? = Some(after);
        Ok(())
    }
}

impl TaskGraphStore for InMemoryTaskGraphStore {
    fn transaction<T, F>(&self, f: F) -> TaskGraphResult<T>
    where
        F: FnOnce(&mut dyn GraphTransaction) -> TaskGraphResult<T>,
    {
        let write_budget = lock(&self.injected_failure)?.take();
        let mut committed = lock(&self.state)?;
        let mut transaction = MemoryTransaction {
            working: committed.clone(),
            write_budget,
        };
        let value = f(&mut transaction)?;
        *committed = transaction.working;
        Ok(value)
    }
}

struct MemoryTransaction {
    working: GraphState,
    write_budget: Option<usize>,
}

impl MemoryTransaction {
    fn record_write(&mut self) -> TaskGraphResult<()> {
        match self.write_budget {
            Some(0) => Err(TaskGraphError::persistence(std::io::Error::other(
                "injected write failure",
            ))),
            Some(remaining) => {
                self.write_budget = Some(remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn task_mut(&mut self, task: &TaskRef) -> TaskGraphResult<&mut Task> {
        self.working
            .tasks
            .iter_mut()
            .find(|row| row.task_ref() == task)
            .ok_or_else(|| TaskGraphError::TaskNotFound(task.clone()))
    }
}

impl GraphTransaction for MemoryTransaction {
    fn insert_operation(&mut self, record: &OperationRecord) -> TaskGraphResult<()> {
        self.record_write()?;
        if self.working.operations.iter().any(|op| op.id() == record.id()) {
            return Err(TaskGraphError::DuplicateOperation(record.id().clone()));
        }
        self.working.operations.push(record.clone());
        Ok(())
    }

    fn operation(&mut self, id: &OperationId) -> TaskGraphResult<Option<OperationRecord>> {
        Ok(self
            .working
            .operations
            .iter()
            .find(|op| op.id() == id)
            .cloned())
    }

    fn lock_operation(&mut self, _id: &OperationId) -> TaskGraphResult<()> {
        // Transactions already hold the whole store.
        Ok(())
    }

    fn delete_operation(&mut self, id: &OperationId) -> TaskGraphResult<bool> {
        self.record_write()?;
        let before = self.working.operations.len();
        self.working.operations.retain(|op| op.id() != id);
        if self.working.operations.len() == before {
            return Ok(false);
        }
        self.working.tasks.retain(|task| task.operation() != id);
        self.working
            .dependencies
            .retain(|(task, _)| task.operation() != id);
        self.working
            .assignments
            .retain(|(task, _)| task.operation() != id);
        Ok(true)
    }

    fn insert_task(&mut self, task: &Task) -> TaskGraphResult<()> {
        self.record_write()?;
        if !self
            .working
            .operations
            .iter()
            .any(|op| op.id() == task.operation())
        {
            return Err(TaskGraphError::OperationNotFound(task.operation().clone()));
        }
        if self
            .working
            .tasks
            .iter()
            .any(|row| row.task_ref() == task.task_ref())
        {
            return Err(TaskGraphError::DuplicateTask(task.task_ref().clone()));
        }
        self.working.tasks.push(task.clone());
        Ok(())
    }

    fn task(&mut self, task: &TaskRef) -> TaskGraphResult<Option<Task>> {
        Ok(self
            .working
            .tasks
            .iter()
            .find(|row| row.task_ref() == task)
            .cloned())
    }

    fn tasks(&mut self, operation: &OperationId) -> TaskGraphResult<Vec<Task>> {
        Ok(self
            .working
            .tasks
            .iter()
            .filter(|row| row.operation() == operation)
            .cloned()
            .collect())
    }

    fn update_task(&mut self, task: &Task) -> TaskGraphResult<()> {
        self.record_write()?;
        let row = self.task_mut(task.task_ref())?;
        *row = task.clone();
        Ok(())
    }

    fn set_state(&mut self, task: &TaskRef, state: TaskState) -> TaskGraphResult<()> {
        self.record_write()?;
        self.task_mut(task)?.set_state(state);
        Ok(())
    }

    fn delete_task(&mut self, task: &TaskRef) -> TaskGraphResult<bool> {
        self.record_write()?;
        let before = self.working.tasks.len();
        self.working.tasks.retain(|row| row.task_ref() != task);
        if self.working.tasks.len() == before {
            return Ok(false);
        }
        self.working.dependencies.retain(|(from, depends_on)| {
            from != task && !(from.operation() == task.operation() && depends_on == task.task())
        });
        self.working.assignments.retain(|(row, _)| row != task);
        Ok(true)
    }

    fn delete_dependencies(&mut self, task: &TaskRef) -> TaskGraphResult<()> {
        self.record_write()?;
        self.working.dependencies.retain(|(from, _)| from != task);
        Ok(())
    }

    fn insert_dependency(&mut self, task: &TaskRef, depends_on: &TaskId) -> TaskGraphResult<()> {
        self.record_write()?;
        self.working
            .dependencies
            .push((task.clone(), depends_on.clone()));
        Ok(())
    }

    fn delete_dependency(
        &mut self,
        task: &TaskRef,
        depends_on: &TaskId,
    ) -> TaskGraphResult<bool> {
        self.record_write()?;
        let before = self.working.dependencies.len();
        self.working
            .dependencies
            .retain(|(from, to)| !(from == task && to == depends_on));
        Ok(self.working.dependencies.len() != before)
    }

    fn dependencies(&mut self, task: &TaskRef) -> TaskGraphResult<Vec<TaskId>> {
        Ok(self
            .working
            .dependencies
            .iter()
            .filter(|(from, _)| from == task)
            .map(|(_, to)| to.clone())
            .collect())
    }

    fn operation_dependencies(
        &mut self,
        operation: &OperationId,
    ) -> TaskGraphResult<Vec<(TaskId, TaskId)>> {
        Ok(self
            .working
            .dependencies
            .iter()
            .filter(|(from, _)| from.operation() == operation)
            .map(|(from, to)| (from.task().clone(), to.clone()))
            .collect())
    }

    fn delete_assignments(&mut self, task: &TaskRef) -> TaskGraphResult<()> {
        self.record_write()?;
        self.working.assignments.retain(|(row, _)| row != task);
        Ok(())
    }

    fn insert_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
        self.record_write()?;
        let exists = self
            .working
            .assignments
            .iter()
            .any(|(row, assignee)| row == task && assignee == agent);
        if !exists {
            self.working
                .assignments
                .push((task.clone(), agent.clone()));
        }
        Ok(())
    }

    fn delete_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool> {
        self.record_write()?;
        let before = self.working.assignments.len();
        self.working
            .assignments
            .retain(|(row, assignee)| !(row == task && assignee == agent));
        Ok(self.working.assignments.len() != before)
    }

    fn assignments(&mut self, task: &TaskRef) -> TaskGraphResult<Vec<AgentId>> {
        Ok(self
            .working
            .assignments
            .iter()
            .filter(|(row, _)| row == task)
            .map(|(_, agent)| agent.clone())
            .collect())
    }

    fn has_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool> {
        Ok(self
            .working
            .assignments
            .iter()
            .any(|(row, assignee)| row == task && assignee == agent))
    }

    fn operation_assignments(
        &mut self,
        operation: &OperationId,
    ) -> TaskGraphResult<Vec<(TaskId, AgentId)>> {
        Ok(self
            .working
            .assignments
            .iter()
            .filter(|(row, _)| row.operation() == operation)
            .map(|(row, agent)| (row.task().clone(), agent.clone()))
            .collect())
    }
}
