//! Diesel row models for task graph persistence.

use super::schema::{assignments, depends, operation_teams, operations, tasks};
use diesel::prelude::*;

/// Insert model for operation headers.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = operations)]
pub struct NewOperationRow {
    /// Operation identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Insert model for operation team shares.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = operation_teams)]
pub struct NewOperationTeamRow {
    /// Owning operation.
    pub op_id: String,
    /// Team identifier.
    pub team_id: String,
}

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Owning operation.
    pub op_id: String,
    /// Task identifier.
    pub id: String,
    /// Task kind.
    pub kind: String,
    /// Lifecycle state.
    pub state: String,
    /// Sequence order.
    pub task_order: i16,
    /// Zone number.
    pub zone: i16,
    /// Minutes relative to operation start.
    pub delta_minutes: i32,
    /// Free-form comment.
    pub comment: Option<String>,
}

/// Insert model for tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Owning operation.
    pub op_id: String,
    /// Task identifier.
    pub id: String,
    /// Task kind.
    pub kind: String,
    /// Lifecycle state.
    pub state: String,
    /// Sequence order.
    pub task_order: i16,
    /// Zone number.
    pub zone: i16,
    /// Minutes relative to operation start.
    pub delta_minutes: i32,
    /// Free-form comment.
    pub comment: Option<String>,
}

/// Insert model for dependency edges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = depends)]
pub struct NewDependencyRow {
    /// Owning operation.
    pub op_id: String,
    /// Dependent task.
    pub task_id: String,
    /// Task that must come first.
    pub depends_on: String,
}

/// Insert model for assignments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = assignments)]
pub struct NewAssignmentRow {
    /// Owning operation.
    pub op_id: String,
    /// Assigned task.
    pub task_id: String,
    /// Assigned agent.
    pub agent_id: String,
}
