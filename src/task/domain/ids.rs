//! Identifier types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length, in characters, of an operation or task identifier.
pub const MAX_TASK_ID_LENGTH: usize = 64;

/// Identifier of an operation (one planning document).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Creates an operation identifier from a trimmed, non-empty value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyOperationId`] when the value is empty
    /// after trimming, or [`TaskDomainError::OperationIdTooLong`] beyond
    /// [`MAX_TASK_ID_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyOperationId);
        }
        if trimmed.chars().count() > MAX_TASK_ID_LENGTH {
            return Err(TaskDomainError::OperationIdTooLong(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a task, unique within its operation.
///
/// Task identifiers are minted by the planning client, so they are opaque
/// strings rather than generated UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task identifier from a trimmed, non-empty value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskId`] when the value is empty after
    /// trimming, or [`TaskDomainError::TaskIdTooLong`] beyond
    /// [`MAX_TASK_ID_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTaskId);
        }
        if trimmed.chars().count() > MAX_TASK_ID_LENGTH {
            return Err(TaskDomainError::TaskIdTooLong(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified task address: the owning operation plus the task id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    operation: OperationId,
    task: TaskId,
}

impl TaskRef {
    /// Creates a task reference.
    #[must_use]
    pub const fn new(operation: OperationId, task: TaskId) -> Self {
        Self { operation, task }
    }

    /// Parses both identifiers and builds a reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when either identifier is blank.
    pub fn from_parts(operation: &str, task: &str) -> Result<Self, TaskDomainError> {
        Ok(Self::new(OperationId::new(operation)?, TaskId::new(task)?))
    }

    /// Returns the owning operation.
    #[must_use]
    pub const fn operation(&self) -> &OperationId {
        &self.operation
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task(&self) -> &TaskId {
        &self.task
    }

    /// Returns a reference to another task of the same operation.
    #[must_use]
    pub fn sibling(&self, task: TaskId) -> Self {
        Self::new(self.operation.clone(), task)
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.operation, self.task)
    }
}
