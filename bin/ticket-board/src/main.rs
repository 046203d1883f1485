//! # Ticket Board Binary
//!
//! The entry point that assembles the server from settings.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tb_api::handlers::AppState;
use tb_api::middleware::{cors_policy, security_headers, standard_middleware};
use tb_config::Settings;
use tb_db_sqlite::SqliteTicketRepo;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tb_config::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Storage
    let repo = SqliteTicketRepo::new(&settings.database_url, settings.max_connections).await?;

    // 2. Shared state
    let state = web::Data::new(AppState {
        repo: Arc::new(repo),
        paging: settings.paging_defaults(),
    });

    let (host, port) = settings.bind_address();
    log::info!(
        "ticket board starting on http://{host}:{port} ({:?} pagination)",
        settings.pagination_mode
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(security_headers())
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .configure(tb_api::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
