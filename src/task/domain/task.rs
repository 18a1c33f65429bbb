//! Task record and lifecycle state types.

use super::{OperationId, ParseTaskKindError, ParseTaskStateError, TaskId, TaskRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle state.
///
/// `pending → assigned → acknowledged → completed`; marking a completed task
/// incomplete returns it to `assigned`, and rejecting or clearing
/// assignments returns any task to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Nobody is assigned.
    Pending,
    /// At least one agent is assigned.
    Assigned,
    /// An assignee has acknowledged the task.
    Acknowledged,
    /// The task has been carried out.
    Completed,
}

impl TaskState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Acknowledged => "acknowledged",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for TaskState {
    type Error = ParseTaskStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "acknowledged" => Ok(Self::Acknowledged),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseTaskStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a task represents on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A point of interest with an action to perform.
    Marker,
    /// A connection between two points.
    Link,
}

impl TaskKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Link => "link",
        }
    }
}

impl TryFrom<&str> for TaskKind {
    type Error = ParseTaskKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(Self::Marker),
            "link" => Ok(Self::Link),
            _ => Err(ParseTaskKindError(value.to_owned())),
        }
    }
}

/// Geographic zone a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(i16);

impl Zone {
    /// The zone new tasks are placed in.
    pub const PRIMARY: Self = Self(1);

    /// Wraps a raw zone number.
    #[must_use]
    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    /// Returns the raw zone number.
    #[must_use]
    pub const fn value(self) -> i16 {
        self.0
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::PRIMARY
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One assignable unit of work.
///
/// A task row carries only scalar attributes. Its dependency and assignment
/// sets live in their own stores and are joined in by [`super::TaskView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    task_ref: TaskRef,
    kind: TaskKind,
    state: TaskState,
    order: i16,
    zone: Zone,
    delta_minutes: i32,
    comment: Option<String>,
}

impl Task {
    /// Creates a pending task in the primary zone.
    #[must_use]
    pub fn new(operation: OperationId, id: TaskId, kind: TaskKind) -> Self {
        Self {
            task_ref: TaskRef::new(operation, id),
            kind,
            state: TaskState::Pending,
            order: 0,
            zone: Zone::PRIMARY,
            delta_minutes: 0,
            comment: None,
        }
    }

    /// Sets the sequence order.
    #[must_use]
    pub const fn with_order(mut self, order: i16) -> Self {
        self.order = order;
        self
    }

    /// Sets the zone.
    #[must_use]
    pub const fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    /// Sets the delta in minutes relative to the operation start.
    #[must_use]
    pub const fn with_delta_minutes(mut self, delta_minutes: i32) -> Self {
        self.delta_minutes = delta_minutes;
        self
    }

    /// Sets the free-form comment. Blank comments are stored as `None`.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment(comment);
        self
    }

    /// Sets the lifecycle state, used when rehydrating persisted rows.
    #[must_use]
    pub const fn with_state(mut self, state: TaskState) -> Self {
        self.state = state;
        self
    }

    /// Returns the fully qualified task reference.
    #[must_use]
    pub const fn task_ref(&self) -> &TaskRef {
        &self.task_ref
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        self.task_ref.task()
    }

    /// Returns the owning operation.
    #[must_use]
    pub const fn operation(&self) -> &OperationId {
        self.task_ref.operation()
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the sequence order. Not guaranteed unique within an operation.
    #[must_use]
    pub const fn order(&self) -> i16 {
        self.order
    }

    /// Returns the zone.
    #[must_use]
    pub const fn zone(&self) -> Zone {
        self.zone
    }

    /// Returns the delta in minutes.
    #[must_use]
    pub const fn delta_minutes(&self) -> i32 {
        self.delta_minutes
    }

    /// Returns the comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub(crate) const fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    pub(crate) fn set_comment(&mut self, comment: impl Into<String>) {
        let value = comment.into();
        self.comment = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
    }

    pub(crate) const fn set_zone(&mut self, zone: Zone) {
        self.zone = zone;
    }

    pub(crate) const fn set_order(&mut self, order: i16) {
        self.order = order;
    }

    pub(crate) const fn set_delta_minutes(&mut self, delta_minutes: i32) {
        self.delta_minutes = delta_minutes;
    }
}
