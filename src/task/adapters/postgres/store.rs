//! `PostgreSQL` store implementation for task graph persistence.

use super::{
    models::{
        NewAssignmentRow, NewDependencyRow, NewOperationRow, NewOperationTeamRow, NewTaskRow,
        TaskRow,
    },
    schema::{assignments, depends, operation_teams, operations, tasks},
};
use crate::identity::domain::{AgentId, TeamId};
use crate::task::{
    domain::{OperationId, OperationRecord, Task, TaskId, TaskKind, TaskRef, TaskState, Zone},
    ports::{GraphTransaction, TaskGraphError, TaskGraphResult, TaskGraphStore},
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the task graph store.
pub type TaskGraphPgPool = Pool<ConnectionManager<PgConnection>>;

impl From<DieselError> for TaskGraphError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed task graph store.
///
/// Each [`TaskGraphStore::transaction`] call checks out one pooled
/// connection and runs the closure inside a database transaction. The store
/// is synchronous; async callers offload it with
/// [`tokio::task::spawn_blocking`].
#[derive(Debug, Clone)]
pub struct PostgresTaskGraphStore {
    pool: TaskGraphPgPool,
}

impl PostgresTaskGraphStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskGraphPgPool) -> Self {
        Self { pool }
    }
}

impl TaskGraphStore for PostgresTaskGraphStore {
    fn transaction<T, F>(&self, f: F) -> TaskGraphResult<T>
    where
        F: FnOnce(&mut dyn GraphTransaction) -> TaskGraphResult<T>,
    {
        let mut pooled = self.pool.get().map_err(TaskGraphError::persistence)?;
        let connection: &mut PgConnection = &mut pooled;
        connection.transaction::<T, TaskGraphError, _>(|conn| {
            let mut transaction = PgGraphTransaction { conn };
            f(&mut transaction)
        })
    }
}

struct PgGraphTransaction<'conn> {
    conn: &'conn mut PgConnection,
}

impl GraphTransaction for PgGraphTransaction<'_> {
    fn insert_operation(&mut self, record: &OperationRecord) -> TaskGraphResult<()> {
        let row = NewOperationRow {
            id: record.id().as_str().to_owned(),
            name: record.name().to_owned(),
        };
        diesel::insert_into(operations::table)
            .values(&row)
            .execute(self.conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    TaskGraphError::DuplicateOperation(record.id().clone())
                }
                other => TaskGraphError::persistence(other),
            })?;

        let team_rows: Vec<NewOperationTeamRow> = record
            .teams()
            .iter()
            .map(|team| NewOperationTeamRow {
                op_id: record.id().as_str().to_owned(),
                team_id: team.as_str().to_owned(),
            })
            .collect();
        if !team_rows.is_empty() {
            diesel::insert_into(operation_teams::table)
                .values(&team_rows)
                .execute(self.conn)?;
        }
        Ok(())
    }

    fn operation(&mut self, id: &OperationId) -> TaskGraphResult<Option<OperationRecord>> {
        let Some(name) = operations::table
            .find(id.as_str())
            .select(operations::name)
            .first::<String>(self.conn)
            .optional()?
        else {
            return Ok(None);
        };

        let team_ids = operation_teams::table
            .filter(operation_teams::op_id.eq(id.as_str()))
            .order(operation_teams::seq.asc())
            .select(operation_teams::team_id)
            .load::<String>(self.conn)?;
        let teams = team_ids
            .into_iter()
            .map(TeamId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(TaskGraphError::persistence)?;

        Ok(Some(OperationRecord::new(id.clone(), name).with_teams(teams)))
    }

    fn lock_operation(&mut self, id: &OperationId) -> TaskGraphResult<()> {
        operations::table
            .find(id.as_str())
            .select(operations::id)
            .for_update()
            .first::<String>(self.conn)
            .optional()?;
        Ok(())
    }

    fn delete_operation(&mut self, id: &OperationId) -> TaskGraphResult<bool> {
        let op_id = id.as_str();
        diesel::delete(depends::table.filter(depends::op_id.eq(op_id))).execute(self.conn)?;
        diesel::delete(assignments::table.filter(assignments::op_id.eq(op_id)))
            .execute(self.conn)?;
        diesel::delete(tasks::table.filter(tasks::op_id.eq(op_id))).execute(self.conn)?;
        diesel::delete(operation_teams::table.filter(operation_teams::op_id.eq(op_id)))
            .execute(self.conn)?;
        let deleted = diesel::delete(operations::table.find(op_id)).execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn insert_task(&mut self, task: &Task) -> TaskGraphResult<()> {
        let operation_exists = operations::table
            .find(task.operation().as_str())
            .select(operations::id)
            .first::<String>(self.conn)
            .optional()?
            .is_some();
        if !operation_exists {
            return Err(TaskGraphError::OperationNotFound(task.operation().clone()));
        }

        diesel::insert_into(tasks::table)
            .values(&to_new_row(task))
            .execute(self.conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    TaskGraphError::DuplicateTask(task.task_ref().clone())
                }
                other => TaskGraphError::persistence(other),
            })?;
        Ok(())
    }

    fn task(&mut self, task: &TaskRef) -> TaskGraphResult<Option<Task>> {
        let row = tasks::table
            .filter(tasks::op_id.eq(task.operation().as_str()))
            .filter(tasks::id.eq(task.task().as_str()))
            .select(TaskRow::as_select())
            .first::<TaskRow>(self.conn)
            .optional()?;
        row.map(row_to_task).transpose()
    }

    fn tasks(&mut self, operation: &OperationId) -> TaskGraphResult<Vec<Task>> {
        tasks::table
            .filter(tasks::op_id.eq(operation.as_str()))
            .order(tasks::seq.asc())
            .select(TaskRow::as_select())
            .load::<TaskRow>(self.conn)?
            .into_iter()
            .map(row_to_task)
            .collect()
    }

    fn update_task(&mut self, task: &Task) -> TaskGraphResult<()> {
        let updated = diesel::update(
            tasks::table
                .filter(tasks::op_id.eq(task.operation().as_str()))
                .filter(tasks::id.eq(task.id().as_str())),
        )
        .set((
            tasks::state.eq(task.state().as_str()),
            tasks::task_order.eq(task.order()),
            tasks::zone.eq(task.zone().value()),
            tasks::delta_minutes.eq(task.delta_minutes()),
            tasks::comment.eq(task.comment()),
        ))
        .execute(self.conn)?;
        if updated == 0 {
            return Err(TaskGraphError::TaskNotFound(task.task_ref().clone()));
        }
        Ok(())
    }

    fn set_state(&mut self, task: &TaskRef, state: TaskState) -> TaskGraphResult<()> {
        let updated = diesel::update(
            tasks::table
                .filter(tasks::op_id.eq(task.operation().as_str()))
                .filter(tasks::id.eq(task.task().as_str())),
        )
        .set(tasks::state.eq(state.as_str()))
        .execute(self.conn)?;
        if updated == 0 {
            return Err(TaskGraphError::TaskNotFound(task.clone()));
        }
        Ok(())
    }

    fn delete_task(&mut self, task: &TaskRef) -> TaskGraphResult<bool> {
        let op_id = task.operation().as_str();
        let task_id = task.task().as_str();
        diesel::delete(
            depends::table
                .filter(depends::op_id.eq(op_id))
                .filter(depends::task_id.eq(task_id).or(depends::depends_on.eq(task_id))),
        )
        .execute(self.conn)?;
        diesel::delete(
            assignments::table
                .filter(assignments::op_id.eq(op_id))
                .filter(assignments::task_id.eq(task_id)),
        )
        .execute(self.conn)?;
        let deleted = diesel::delete(
            tasks::table
                .filter(tasks::op_id.eq(op_id))
                .filter(tasks::id.eq(task_id)),
        )
        .execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn delete_dependencies(&mut self, task: &TaskRef) -> TaskGraphResult<()> {
        diesel::delete(
            depends::table
                .filter(depends::op_id.eq(task.operation().as_str()))
                .filter(depends::task_id.eq(task.task().as_str())),
        )
        .execute(self.conn)?;
        Ok(())
    }

    fn insert_dependency(&mut self, task: &TaskRef, depends_on: &TaskId) -> TaskGraphResult<()> {
        let row = NewDependencyRow {
            op_id: task.operation().as_str().to_owned(),
            task_id: task.task().as_str().to_owned(),
            depends_on: depends_on.as_str().to_owned(),
        };
        diesel::insert_into(depends::table)
            .values(&row)
            .execute(self.conn)?;
        Ok(())
    }

    fn delete_dependency(
        &mut self,
        task: &TaskRef,
        depends_on: &TaskId,
    ) -> TaskGraphResult<bool> {
        let deleted = diesel::delete(
            depends::table
                .filter(depends::op_id.eq(task.operation().as_str()))
                .filter(depends::task_id.eq(task.task().as_str()))
                .filter(depends::depends_on.eq(depends_on.as_str())),
        )
        .execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn dependencies(&mut self, task: &TaskRef) -> TaskGraphResult<Vec<TaskId>> {
        depends::table
            .filter(depends::op_id.eq(task.operation().as_str()))
            .filter(depends::task_id.eq(task.task().as_str()))
            .order(depends::seq.asc())
            .select(depends::depends_on)
            .load::<String>(self.conn)?
            .into_iter()
            .map(|id| TaskId::new(id).map_err(TaskGraphError::persistence))
            .collect()
    }

    fn operation_dependencies(
        &mut self,
        operation: &OperationId,
    ) -> TaskGraphResult<Vec<(TaskId, TaskId)>> {
        depends::table
            .filter(depends::op_id.eq(operation.as_str()))
            .order(depends::seq.asc())
            .select((depends::task_id, depends::depends_on))
            .load::<(String, String)>(self.conn)?
            .into_iter()
            .map(|(task, depends_on)| {
                Ok((
                    TaskId::new(task).map_err(TaskGraphError::persistence)?,
                    TaskId::new(depends_on).map_err(TaskGraphError::persistence)?,
                ))
            })
            .collect()
    }

    fn delete_assignments(&mut self, task: &TaskRef) -> TaskGraphResult<()> {
        diesel::delete(
            assignments::table
                .filter(assignments::op_id.eq(task.operation().as_str()))
                .filter(assignments::task_id.eq(task.task().as_str())),
        )
        .execute(self.conn)?;
        Ok(())
    }

    fn insert_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<()> {
        let row = NewAssignmentRow {
            op_id: task.operation().as_str().to_owned(),
            task_id: task.task().as_str().to_owned(),
            agent_id: agent.as_str().to_owned(),
        };
        diesel::insert_into(assignments::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(self.conn)?;
        Ok(())
    }

    fn delete_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool> {
        let deleted = diesel::delete(
            assignments::table
                .filter(assignments::op_id.eq(task.operation().as_str()))
                .filter(assignments::task_id.eq(task.task().as_str()))
                .filter(assignments::agent_id.eq(agent.as_str())),
        )
        .execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn assignments(&mut self, task: &TaskRef) -> TaskGraphResult<Vec<AgentId>> {
        assignments::table
            .filter(assignments::op_id.eq(task.operation().as_str()))
            .filter(assignments::task_id.eq(task.task().as_str()))
            .order(assignments::seq.asc())
            .select(assignments::agent_id)
            .load::<String>(self.conn)?
            .into_iter()
            .map(|id| AgentId::new(id).map_err(TaskGraphError::persistence))
            .collect()
    }

    fn has_assignment(&mut self, task: &TaskRef, agent: &AgentId) -> TaskGraphResult<bool> {
        let count = assignments::table
            .filter(assignments::op_id.eq(task.operation().as_str()))
            .filter(assignments::task_id.eq(task.task().as_str()))
            .filter(assignments::agent_id.eq(agent.as_str()))
            .count()
            .get_result::<i64>(self.conn)?;
        Ok(count > 0)
    }

    fn operation_assignments(
        &mut self,
        operation: &OperationId,
    ) -> TaskGraphResult<Vec<(TaskId, AgentId)>> {
        assignments::table
            .filter(assignments::op_id.eq(operation.as_str()))
            .order(assignments::seq.asc())
            .select((assignments::task_id, assignments::agent_id))
            .load::<(String, String)>(self.conn)?
            .into_iter()
            .map(|(task, agent)| {
                Ok((
                    TaskId::new(task).map_err(TaskGraphError::persistence)?,
                    AgentId::new(agent).map_err(TaskGraphError::persistence)?,
                ))
            })
            .collect()
    }
}

fn to_new_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        op_id: task.operation().as_str().to_owned(),
        id: task.id().as_str().to_owned(),
        kind: task.kind().as_str().to_owned(),
        state: task.state().as_str().to_owned(),
        task_order: task.order(),
        zone: task.zone().value(),
        delta_minutes: task.delta_minutes(),
        comment: task.comment().map(str::to_owned),
    }
}

fn row_to_task(row: TaskRow) -> TaskGraphResult<Task> {
    let TaskRow {
        op_id,
        id,
        kind: persisted_kind,
        state: persisted_state,
        task_order,
        zone,
        delta_minutes,
        comment,
    } = row;

    let operation = OperationId::new(op_id).map_err(TaskGraphError::persistence)?;
    let task_id = TaskId::new(id).map_err(TaskGraphError::persistence)?;
    let kind =
        TaskKind::try_from(persisted_kind.as_str()).map_err(TaskGraphError::persistence)?;
    let state =
        TaskState::try_from(persisted_state.as_str()).map_err(TaskGraphError::persistence)?;

    let task = Task::new(operation, task_id, kind)
        .with_state(state)
        .with_order(task_order)
        .with_zone(Zone::new(zone))
        .with_delta_minutes(delta_minutes);
    Ok(match comment {
        Some(text) => task.with_comment(text),
        None => task,
    })
}
