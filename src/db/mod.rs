//! Persistence seams.
//!
//! Handlers and the authentication gate only see the [`UserRepository`] and
//! [`TaskRepository`] traits. [`PgStore`] backs them with Postgres; [`MemoryStore`]
//! keeps everything in process and is what the test suite runs against.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, Task, TaskUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Lookup and creation of user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Exact, case-sensitive username match.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Stores a new user. A taken username is a `BadRequest`.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AppError>;
}

/// CRUD over task records. Lookups return `None` for unknown ids.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, AppError>;

    /// All tasks ordered by id.
    async fn list(&self) -> Result<Vec<Task>, AppError>;

    async fn find(&self, id: i32) -> Result<Option<Task>, AppError>;

    async fn update(&self, id: i32, update: TaskUpdate) -> Result<Option<Task>, AppError>;

    /// Removes the task and returns what was removed.
    async fn delete(&self, id: i32) -> Result<Option<Task>, AppError>;
}
