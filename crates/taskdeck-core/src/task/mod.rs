//! Task records and input validation.
//!
//! A task optionally carries a **remote link** (`remote_event_id`): the id of
//! the calendar event currently representing it. The link is `Some` exactly
//! when such an event is believed to exist; everything that maintains that
//! invariant lives in [`mutator`] and the `sync` module.

mod mutator;

pub use mutator::{ChangeNotifier, TaskMutator};

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 60;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 200;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Starting,
    Progress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Starting => "starting",
            TaskStatus::Progress => "progress",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(TaskStatus::Starting),
            "progress" => Ok(TaskStatus::Progress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(format!("Unknown status: {s}")),
        }
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(format!("Unknown priority: {s}")),
        }
    }
}

/// A stored task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    /// A task due date is a calendar date, not an instant.
    pub due_date: Option<NaiveDate>,
    /// Id of the calendar event representing this task, when one exists.
    pub remote_event_id: Option<String>,
    /// Owner; tasks created while signed out have no owner and no remote link.
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub sync_to_calendar: bool,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, self.description.as_deref())
    }
}

/// Input for updating a task. Editable fields are replaced wholesale;
/// `sync_to_calendar` expresses whether a calendar event should exist
/// after this write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskChange {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub sync_to_calendar: bool,
}

impl TaskChange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let description = (!self.description.is_empty()).then_some(self.description.as_str());
        validate_fields(&self.title, description)
    }
}

fn validate_fields(title: &str, description: Option<&str>) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingField("title"));
    }
    let len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        return Err(ValidationError::InvalidValue {
            field: "title",
            message: format!("must be {TITLE_MIN}-{TITLE_MAX} characters, got {len}"),
        });
    }
    if let Some(description) = description {
        let len = description.chars().count();
        if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&len) {
            return Err(ValidationError::InvalidValue {
                field: "description",
                message: format!("must be {DESCRIPTION_MIN}-{DESCRIPTION_MAX} characters, got {len}"),
            });
        }
    }
    Ok(())
}

/// Per-status task counts for dashboard views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub starting: usize,
    pub progress: usize,
    pub done: usize,
}

/// Number of tasks created on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// UTC date label, e.g. "Jun 1".
    pub date: String,
    pub count: usize,
}
