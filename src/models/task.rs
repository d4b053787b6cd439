use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting to be picked up.
    #[default]
    Waiting,
    /// Task is being worked on.
    InProgress,
    /// Task is finished.
    Done,
    /// Task has been archived.
    InArchive,
}

/// Payload for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskCreate {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// At most 1000 characters.
    #[validate(length(max = 1000))]
    pub description: String,

    /// Defaults to `waiting` when omitted.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Payload for replacing a task's fields.
///
/// `title` and `description` are always overwritten; a missing `status`
/// leaves the current one in place.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: String,

    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// A task ready to be inserted, with its owner resolved.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: Option<i32>,
}

impl NewTask {
    pub fn new(input: TaskCreate, owner_id: i32) -> Self {
        Self {
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            owner_id: Some(owner_id),
        }
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Identifier of the user who created the task. Recorded, not enforced.
    pub owner_id: Option<i32>,
}

impl Task {
    /// Applies an update in place.
    pub fn apply(&mut self, update: TaskUpdate) {
        self.title = update.title;
        self.description = update.description;
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

/// Body returned after a task is deleted.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskDeleted {
    pub title: String,
}
