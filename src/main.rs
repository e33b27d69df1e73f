use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod pdf;
mod routes;
mod utils;
mod workflow;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::routes::Limiters;
use crate::utils::storage::MediaStore;
use crate::utils::username_index::UsernameIndex;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const USERNAME_WARMUP_BATCH: usize = 250;

#[get("/")]
async fn index() -> impl Responder {
    "CESFAM intranet"
}

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
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, prefix = %config.api_prefix, "Server starting...");

    let pool = init_db(&config.database_url).await?;

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("cannot create media root {}", config.media_root))?;
    let media = Data::new(MediaStore::new(&config.media_root, "/media"));

    let username_index = Data::new(UsernameIndex::new());
    let limiters = Limiters::from_config(&config)?;

    {
        let pool = pool.clone();
        let warm_index = username_index.clone();
        actix_web::rt::spawn(async move {
            if let Err(e) = warm_index.warmup(&pool, USERNAME_WARMUP_BATCH).await {
                warn!(error = %e, "Failed to warm up username index");
            }
        });
    }

    let server_addr = config.server_addr.clone();
    let pool_data = Data::new(pool);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(media.clone())
            .app_data(username_index.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data, &limiters))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
