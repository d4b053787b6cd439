use crate::{
    auth::{AuthGate, CurrentUser, LoginForm, RegisterRequest, TokenResponse},
    error::AppError,
    models::UserResponse,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Service status.
///
/// Served at `/users`; `/users/` reaches it through `NormalizePath::trim()`.
#[get("")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "task manager service is running."
    }))
}

/// Register a new user
///
/// ## Responses:
/// - `201 Created`: `{"id": .., "username": ..}`.
/// - `400 Bad Request`: malformed JSON or a username that is already taken.
/// - `422 Unprocessable Entity`: username or password fails validation.
#[post("/create")]
pub async fn create_user(
    gate: web::Data<AuthGate>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = gate
        .register(&register_data.username, &register_data.password)
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Login user
///
/// Takes a form-encoded `username`/`password` pair and returns an access token
/// and a refresh token.
///
/// ## Responses:
/// - `200 OK`: `{"access_token": .., "refresh_token": .., "token_type": "Bearer"}`.
/// - `401 Unauthorized`: unknown username or wrong password (same message for both).
#[post("/login")]
pub async fn login(
    gate: web::Data<AuthGate>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    let user = gate
        .authenticate_credentials(&form.username, &form.password)
        .await?;
    let tokens = gate.issue_tokens(&user)?;
    log::info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// Exchange a refresh token for a new access token.
///
/// Mounted behind `AuthMiddleware::refresh()`, so `user` was resolved from a
/// token whose type is `refresh`.
pub async fn refresh(
    gate: web::Data<AuthGate>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let access_token = gate.refresh_access_token(&user)?;
    Ok(HttpResponse::Ok().json(TokenResponse::access_only(access_token)))
}
