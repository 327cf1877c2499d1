//! Task record model.
//!
//! # Responsibility
//! - Define the value type held by the in-memory task collection.
//! - Reject empty input before a record can exist.
//!
//! # Invariants
//! - `text` is non-empty and not whitespace-only once constructed.
//! - `id` is unique within a session and never reused after deletion.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Session-scoped identifier for a task record.
///
/// Assigned from a monotonic counter at creation time and not persisted;
/// kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = u64;

/// Validation failures for task record construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Input text was empty or whitespace-only.
    EmptyText,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// A single entry in the ordered task list.
///
/// Records are addressed by `id`, not by list position: positions shift
/// when earlier records are deleted, ids do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Session-stable id used by delete operations.
    pub id: TaskId,
    /// User-entered task text. Guaranteed non-empty.
    pub text: String,
}

impl TaskRecord {
    /// Creates a record after checking the non-empty-text invariant.
    ///
    /// Text is stored as given; callers normalize (trim) before calling.
    pub fn new(id: TaskId, text: impl Into<String>) -> Result<Self, TaskValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        Ok(Self { id, text })
    }
}
