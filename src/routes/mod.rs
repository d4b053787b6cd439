pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Registers the `/users` and `/tasks` scopes.
///
/// Expects `web::Data<AuthGate>` and `web::Data<dyn TaskRepository>` in app data.
/// Every `/tasks` route requires an access token; `/users/refresh` requires a
/// refresh token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(users::index)
            .service(users::create_user)
            .service(users::login)
            .service(
                web::resource("/refresh")
                    .wrap(AuthMiddleware::refresh())
                    .route(web::post().to(users::refresh)),
            ),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware::access())
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
