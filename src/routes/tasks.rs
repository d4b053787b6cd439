use crate::{
    auth::CurrentUser,
    db::TaskRepository,
    error::AppError,
    models::{NewTask, TaskCreate, TaskDeleted, TaskUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1 to 200 characters.
/// - `description`: up to 1000 characters.
/// - `status` (optional): `waiting` (default), `in_progress`, `done` or `in_archive`.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `401 Unauthorized`: missing or invalid access token.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_task(
    tasks: web::Data<dyn TaskRepository>,
    task_data: web::Json<TaskCreate>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks
        .create(NewTask::new(task_data.into_inner(), user.id))
        .await?;
    Ok(HttpResponse::Created().json(task))
}

/// Lists every task, ordered by id.
///
/// Tasks are not filtered by owner; any authenticated user sees all of them.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<dyn TaskRepository>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(tasks.list().await?))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `404 Not Found`: no task with that id.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<i32>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .find(task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces a task's title and description, and its status when one is given.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `404 Not Found`: no task with that id.
/// - `422 Unprocessable Entity`: validation failed.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskUpdate>,
    _user: CurrentUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks
        .update(task_id.into_inner(), task_data.into_inner())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task and returns its title.
///
/// ## Responses:
/// - `200 OK`: `{"title": ..}` of the deleted task.
/// - `404 Not Found`: no task with that id.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<dyn TaskRepository>,
    task_id: web::Path<i32>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .delete(task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;
    log::info!("user {} deleted task {}", user.id, task.id);

    Ok(HttpResponse::Ok().json(TaskDeleted { title: task.title }))
}
