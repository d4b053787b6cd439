use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::{header, StatusCode};
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{rt, test, web, App, HttpServer};
use pretty_assertions::assert_eq;
use serde_json::json;
use task_manager::auth::{AuthGate, PasswordHasher, TokenCodec};
use task_manager::config::AuthSettings;
use task_manager::db::{MemoryStore, TaskRepository};
use task_manager::error::INVALID_TOKEN_MESSAGE;
use task_manager::models::{Task, TaskStatus};
use task_manager::routes::{self, health};

fn app_data() -> (web::Data<AuthGate>, web::Data<dyn TaskRepository>) {
    let store = Arc::new(MemoryStore::new());
    let gate = AuthGate::new(
        store.clone(),
        TokenCodec::new(&AuthSettings::new("task_test_secret")),
        PasswordHasher::new(4),
    );
    (
        web::Data::new(gate),
        web::Data::from(store as Arc<dyn TaskRepository>),
    )
}

async fn access_token_for(gate: &AuthGate, username: &str) -> (i32, String) {
    let user = gate.register(username, "Password123!").await.unwrap();
    let tokens = gate.issue_tokens(&user).unwrap();
    (user.id, tokens.access_token)
}

#[actix_rt::test]
async fn test_task_crud_flow() {
    let (gate, tasks) = app_data();
    let app = test::init_service(
        App::new()
            .app_data(gate.clone())
            .app_data(tasks.clone())
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await;
    let (user_id, token) = access_token_for(&gate, "task_owner").await;
    let auth = (header::AUTHORIZATION, format!("Bearer {}", token));

    // Create
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(auth.clone())
        .set_json(json!({ "title": "Write report", "description": "Quarterly numbers" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Task = test::read_body_json(resp).await;
    assert_eq!(created.title, "Write report");
    assert_eq!(created.status, TaskStatus::Waiting);
    assert_eq!(created.owner_id, Some(user_id));

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(auth.clone())
        .set_json(json!({ "title": "Review", "description": "", "status": "in_progress" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let second: Task = test::read_body_json(resp).await;
    assert_eq!(second.status, TaskStatus::InProgress);

    // List
    let req = test::TestRequest::get()
        .uri("/tasks")
        .insert_header(auth.clone())
        .to_request();
    let listed: Vec<Task> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, vec![created.clone(), second.clone()]);

    // Get one
    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(auth.clone())
        .to_request();
    let fetched: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);

    // Update without status keeps the current one
    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}", second.id))
        .insert_header(auth.clone())
        .set_json(json!({ "title": "Review again", "description": "second pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Task = test::read_body_json(resp).await;
    assert_eq!(updated.title, "Review again");
    assert_eq!(updated.status, TaskStatus::InProgress);

    let req = test::TestRequest::put()
        .uri(&format!("/tasks/{}", second.id))
        .insert_header(auth.clone())
        .set_json(json!({ "title": "Review again", "description": "done", "status": "done" }))
        .to_request();
    let updated: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.status, TaskStatus::Done);

    // Delete returns the title
    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(deleted, json!({ "title": "Write report" }));

    // Gone
    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_tasks_are_visible_to_every_authenticated_user() {
    let (gate, tasks) = app_data();
    let app = test::init_service(
        App::new()
            .app_data(gate.clone())
            .app_data(tasks.clone())
            .configure(routes::config),
    )
    .await;
    let (_, owner_token) = access_token_for(&gate, "owner").await;
    let (_, other_token) = access_token_for(&gate, "someone_else").await;

    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", owner_token)))
        .set_json(json!({ "title": "Shared", "description": "visible to all" }))
        .to_request();
    let created: Task = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", other_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_missing_and_invalid_tasks() {
    let (gate, tasks) = app_data();
    let app = test::init_service(
        App::new()
            .app_data(gate.clone())
            .app_data(tasks.clone())
            .configure(routes::config),
    )
    .await;
    let (_, token) = access_token_for(&gate, "validator").await;
    let auth = (header::AUTHORIZATION, format!("Bearer {}", token));

    let test_cases = vec![
        (
            test::TestRequest::get().uri("/tasks/999"),
            StatusCode::NOT_FOUND,
            "get unknown task",
        ),
        (
            test::TestRequest::put()
                .uri("/tasks/999")
                .set_json(json!({ "title": "x", "description": "y" })),
            StatusCode::NOT_FOUND,
            "update unknown task",
        ),
        (
            test::TestRequest::delete().uri("/tasks/999"),
            StatusCode::NOT_FOUND,
            "delete unknown task",
        ),
        (
            test::TestRequest::post()
                .uri("/tasks")
                .set_json(json!({ "title": "", "description": "empty title" })),
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty title",
        ),
        (
            test::TestRequest::post()
                .uri("/tasks")
                .set_json(json!({ "title": "a".repeat(201), "description": "" })),
            StatusCode::UNPROCESSABLE_ENTITY,
            "title too long",
        ),
        (
            test::TestRequest::post()
                .uri("/tasks")
                .set_json(json!({ "title": "No description" })),
            StatusCode::BAD_REQUEST,
            "missing description",
        ),
        (
            test::TestRequest::post()
                .uri("/tasks")
                .set_json(json!({ "title": "t", "description": "d", "status": "blocked" })),
            StatusCode::BAD_REQUEST,
            "unknown status",
        ),
    ];

    for (request, expected_status, description) in test_cases {
        let req = request.insert_header(auth.clone()).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_task_routes_require_a_token() {
    let (gate, tasks) = app_data();
    let app = test::init_service(
        App::new()
            .app_data(gate)
            .app_data(tasks)
            .configure(routes::config),
    )
    .await;

    let requests = vec![
        test::TestRequest::get().uri("/tasks"),
        test::TestRequest::get().uri("/tasks/1"),
        test::TestRequest::delete().uri("/tasks/1"),
        test::TestRequest::get()
            .uri("/tasks")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.token")),
        test::TestRequest::get()
            .uri("/tasks")
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz")),
    ];

    for request in requests {
        let resp = test::call_service(&app, request.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": INVALID_TOKEN_MESSAGE }));
    }
}

#[actix_rt::test]
async fn test_task_collection_accepts_trailing_slash() {
    let (gate, tasks) = app_data();
    let app = test::init_service(
        App::new()
            .app_data(gate.clone())
            .app_data(tasks.clone())
            .wrap(NormalizePath::trim())
            .configure(routes::config),
    )
    .await;
    let (_, token) = access_token_for(&gate, "slasher").await;
    let auth = (header::AUTHORIZATION, format!("Bearer {}", token));

    let req = test::TestRequest::post()
        .uri("/tasks/")
        .insert_header(auth.clone())
        .set_json(json!({ "title": "Trailing", "description": "slash" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for uri in ["/tasks", "/tasks/"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(auth.clone())
            .to_request();
        let listed: Vec<Task> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1, "GET {}", uri);
    }
}

#[actix_rt::test]
async fn test_create_task_unauthorized_over_http() {
    let (gate, tasks) = app_data();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(gate.clone())
            .app_data(tasks.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(health::health)
            .configure(routes::config)
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen on port")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{}/tasks", port))
        .json(&json!({ "title": "Unauthorized Task", "description": "" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    handle.stop(true).await;
}
