//! Runs against a live Postgres instance. Set `DATABASE_URL` and run with
//! `cargo test -- --ignored`.

use pretty_assertions::assert_eq;
use task_manager::db::{PgStore, TaskRepository, UserRepository};
use task_manager::models::{NewTask, TaskStatus, TaskUpdate};
use task_manager::AppError;

async fn connect() -> PgStore {
    dotenv::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&url).await.expect("Failed to connect");
    store.ensure_schema().await.expect("Failed to create schema");
    store
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, chrono::Utc::now().timestamp_micros() % 1_000_000_000)
}

#[actix_rt::test]
#[ignore]
async fn test_user_and_task_lifecycle() {
    let store = connect().await;
    let username = unique_name("pg");

    let user = UserRepository::create(
        &store,
        &username,
        "$2b$04$placeholderplaceholderplaceholderplaceholderplacehold",
    )
    .await
    .unwrap();
    assert_eq!(
        store.find_by_username(&username).await.unwrap().map(|u| u.id),
        Some(user.id)
    );

    match UserRepository::create(&store, &username, "irrelevant").await {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Username already registered"),
        other => panic!("expected duplicate rejection, got {:?}", other.map(|u| u.id)),
    }

    let task = TaskRepository::create(
        &store,
        NewTask {
            title: "pg task".into(),
            description: "stored".into(),
            status: TaskStatus::default(),
            owner_id: Some(user.id),
        },
    )
    .await
    .unwrap();
    assert_eq!(task.status, TaskStatus::Waiting);
    assert_eq!(task.owner_id, Some(user.id));

    let updated = store
        .update(
            task.id,
            TaskUpdate {
                title: "pg task".into(),
                description: "changed".into(),
                status: None,
            },
        )
        .await
        .unwrap()
        .expect("task exists");
    assert_eq!(updated.description, "changed");
    assert_eq!(updated.status, TaskStatus::Waiting);

    let deleted = store.delete(task.id).await.unwrap();
    assert_eq!(deleted.map(|t| t.title), Some("pg task".to_string()));
    assert!(store.find(task.id).await.unwrap().is_none());
}
