use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    middleware::{Logger, NormalizePath},
    web, App, HttpServer,
};

use task_manager::auth::{AuthGate, PasswordHasher, TokenCodec};
use task_manager::config::Config;
use task_manager::db::{PgStore, TaskRepository};
use task_manager::routes::{self, health};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    store.ensure_schema().await?;

    let gate = web::Data::new(AuthGate::new(
        store.clone(),
        TokenCodec::new(&config.auth),
        PasswordHasher::new(config.auth.bcrypt_cost),
    ));
    let tasks: web::Data<dyn TaskRepository> = web::Data::from(store as Arc<dyn TaskRepository>);

    log::info!("Starting {} at {}", config.app_title, config.server_url());
    HttpServer::new(move || {
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
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    Ok(())
}
