//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record shared by both task lists.
//! - Own text validation rules applied on create and edit.
//!
//! # Invariants
//! - `id` is assigned once and never reused for another task.
//! - `mode` is fixed at creation; switching the active mode never rewrites it.
//! - `text` is non-empty and at most `TASK_TEXT_MAX_CHARS` scalar values.
//! - `editing` is transient UI state and is never serialized.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum task text length in Unicode scalar values.
pub const TASK_TEXT_MAX_CHARS: usize = 15;

/// Stable, ordered task identifier.
///
/// Holds the creation time in epoch milliseconds, bumped when needed so ids
/// stay strictly increasing within one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Returns the next id given the current clock and the highest id issued so far.
    pub fn next_after(now_epoch_ms: i64, last_issued: Option<TaskId>) -> Self {
        match last_issued {
            Some(TaskId(last)) if last >= now_epoch_ms => Self(last.saturating_add(1)),
            _ => Self(now_epoch_ms),
        }
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(Self)
    }
}

/// Task list a task belongs to, and the list currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    #[default]
    Work,
    Travel,
}

impl AppMode {
    /// Stable lowercase id used in persisted task records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Travel => "travel",
        }
    }

    /// Header label shown on the mode switch.
    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Travel => "Travel",
        }
    }

    /// Hint shown in the new-task entry control.
    pub fn input_placeholder(self) -> &'static str {
        match self {
            Self::Work => "Add a to-do",
            Self::Travel => "Where do you want to go?",
        }
    }

    /// Parses `work` / `travel`, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Some(Self::Work),
            "travel" => Some(Self::Travel),
            _ => None,
        }
    }

    /// Boolean shape of the persisted `mode` entry (`true` = Work).
    pub fn is_work(self) -> bool {
        matches!(self, Self::Work)
    }

    pub fn from_is_work(is_work: bool) -> Self {
        if is_work {
            Self::Work
        } else {
            Self::Travel
        }
    }
}

impl Display for AppMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection reasons for task text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyText,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Validates and normalizes raw task text.
///
/// Empty input is rejected. Whitespace is not trimmed. Input longer than
/// `TASK_TEXT_MAX_CHARS` is cut to that many scalar values, the same way the
/// entry control caps its length.
pub fn normalize_task_text(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(raw.chars().take(TASK_TEXT_MAX_CHARS).collect())
}

/// One to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Carried by the collection key in the persisted layout.
    #[serde(skip, default = "placeholder_id")]
    pub id: TaskId,
    pub text: String,
    pub mode: AppMode,
    #[serde(default)]
    pub completed: bool,
    /// Inline editor state. Resets to `false` on every load.
    #[serde(skip)]
    pub editing: bool,
}

fn placeholder_id() -> TaskId {
    TaskId(0)
}

impl Task {
    /// Creates an active, non-editing task.
    ///
    /// Callers pass text already accepted by `normalize_task_text`.
    pub fn new(id: TaskId, text: impl Into<String>, mode: AppMode) -> Self {
        Self {
            id,
            text: text.into(),
            mode,
            completed: false,
            editing: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}
