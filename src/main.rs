use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod docs;
mod error;
mod ledger;
mod model;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_support;
mod utils;

use config::{Config, StorageBackend};
use db::{bootstrap, init_db, seeded_memory_directory};
use directory::MySqlDirectory;
use ledger::{InMemoryPunchStore, MySqlPunchStore};
use state::AppState;

use crate::docs::ApiDoc;
use crate::utils::employee_code_cache;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(storage = ?config.storage, "Server starting...");

    let state = match config.storage {
        StorageBackend::MySql => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = init_db(database_url).await?;
            bootstrap(&pool, &config.admin_password).await?;

            let pool_for_cache_warmup = pool.clone();
            actix_web::rt::spawn(async move {
                if let Err(e) =
                    employee_code_cache::warmup_employee_code_cache(&pool_for_cache_warmup, 250).await
                {
                    warn!(error = %e, "Failed to warmup employee code cache");
                }
            });

            AppState::new(
                Arc::new(MySqlPunchStore::new(pool.clone())),
                Arc::new(MySqlDirectory::new(pool)),
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; records are lost on restart");
            AppState::new(
                Arc::new(InMemoryPunchStore::new()),
                Arc::new(seeded_memory_directory(&config.admin_password)?),
            )
        }
    };

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .configure(|cfg| state.register(cfg))
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
