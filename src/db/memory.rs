use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewTask, Task, TaskUpdate, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    tasks: BTreeMap<i32, Task>,
    next_user_id: i32,
    next_task_id: i32,
}

/// In-process store with the same semantics as the Postgres one.
///
/// Ids start at 1 and are never reused, like a `SERIAL` column.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user, leaving their tasks ownerless (`ON DELETE SET NULL`).
    pub async fn remove_user(&self, id: i32) -> Option<User> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id);
        if removed.is_some() {
            for task in tables.tasks.values_mut() {
                if task.owner_id == Some(id) {
                    task.owner_id = None;
                }
            }
        }
        removed
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|user| user.username == username) {
            return Err(AppError::BadRequest("Username already registered".into()));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(owner_id) = task.owner_id {
            if !tables.users.contains_key(&owner_id) {
                return Err(AppError::BadRequest("Owner does not exist".into()));
            }
        }

        tables.next_task_id += 1;
        let task = Task {
            id: tables.next_task_id,
            title: task.title,
            description: task.description,
            status: task.status,
            owner_id: task.owner_id,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.tables.read().await.tasks.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> Result<Option<Task>, AppError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn update(&self, id: i32, update: TaskUpdate) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tasks.get_mut(&id).map(|task| {
            task.apply(update);
            task.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<Option<Task>, AppError> {
        Ok(self.tables.write().await.tasks.remove(&id))
    }
}
