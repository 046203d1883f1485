//! # tb-api
//!
//! The web routing and orchestration layer for the ticket board.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the ticket list.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the list under a different prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // The ticket list, also re-requested by incremental clients
            .route("/", web::get().to(handlers::index))
            .route("/health", web::get().to(handlers::health)),
    );
}
