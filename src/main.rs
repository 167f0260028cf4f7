use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use sekolah::{
    config::Config,
    db::init_db,
    docs::ApiDoc,
    notify::{Notifier, push::PushGateway},
    routes, scheduler,
    settings::SettingsResolver,
    state::AppState,
    store::MySqlStore,
    wib::SystemClock,
};

#[get("/")]
async fn index() -> impl Responder {
    "Sekolah attendance service"
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
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.run_migrations).await?;

    let notifier: Option<Arc<dyn Notifier>> = match PushGateway::from_config(&config) {
        Some(gateway) => Some(Arc::new(gateway)),
        None => {
            warn!("PUSH_GATEWAY_URL / PUSH_SERVER_KEY not set, reminders will fail");
            None
        }
    };

    let state = Data::new(AppState {
        store: Arc::new(MySqlStore::new(pool.clone())),
        notifier,
        clock: Arc::new(SystemClock),
        settings: SettingsResolver::new(config.settings_cache_path.clone()),
        reminder_lead_minutes: config.reminder_lead_minutes,
    });

    if config.scheduler_enabled {
        scheduler::spawn(state.clone());
        info!("In-process scheduler enabled");
    }

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(state.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await
    .context("Server terminated with an error")
}
