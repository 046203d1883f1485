//! Replaces every ticket with the static dataset.
//!
//! Usage: `seed [path/to/tickets.json]` (defaults to the `seed_path` setting).

use anyhow::Context;
use tb_config::Settings;
use tb_core::models::NewTicket;
use tb_core::traits::TicketRepo;
use tb_core::AppError;
use tb_db_sqlite::SqliteTicketRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tb_config::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;
    let path = std::env::args().nth(1).unwrap_or_else(|| settings.seed_path.clone());

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(AppError::NotFound("seed dataset".into(), path).into());
    }
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading seed dataset {path}"))?;
    let tickets: Vec<NewTicket> =
        serde_json::from_str(&raw).with_context(|| format!("parsing seed dataset {path}"))?;

    let repo = SqliteTicketRepo::new(&settings.database_url, settings.max_connections).await?;
    let inserted = repo.replace_all(tickets).await?;

    log::info!("seeded {inserted} ticket(s) from {path} into {}", settings.database_url);
    Ok(())
}
