use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewTask, Task, TaskUpdate, User};

const SCHEMA: &[&str] = &[
    "DO $$ BEGIN
        CREATE TYPE task_status AS ENUM ('waiting', 'in_progress', 'done', 'in_archive');
     EXCEPTION WHEN duplicate_object THEN NULL;
     END $$",
    "CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username VARCHAR(30) NOT NULL UNIQUE,
        password_hash VARCHAR(72) NOT NULL
     )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id SERIAL PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        description VARCHAR(1000) NOT NULL,
        status task_status NOT NULL DEFAULT 'waiting',
        owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL
     )",
    "CREATE INDEX IF NOT EXISTS tasks_title_idx ON tasks (title)",
];

const TASK_COLUMNS: &str = "id, title, description, status, owner_id";

/// Postgres-backed store for users and tasks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the enum type, tables and index when they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        log::info!("database schema ready");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2)
             RETURNING id, username, password_hash",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::BadRequest(_) => AppError::BadRequest("Username already registered".into()),
            other => other,
        })
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (title, description, status, owner_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list(&self) -> Result<Vec<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id");
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn find(&self, id: i32) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn update(&self, id: i32, update: TaskUpdate) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks
             SET title = $1, description = $2, status = COALESCE($3, status)
             WHERE id = $4
             RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(update.title)
            .bind(update.description)
            .bind(update.status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete(&self, id: i32) -> Result<Option<Task>, AppError> {
        let sql = format!("DELETE FROM tasks WHERE id = $1 RETURNING {TASK_COLUMNS}");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }
}
