//! # tb-config
//!
//! Layered settings shared by the server, the seeder and the terminal client.
//! Sources, lowest priority first: built-in defaults, an optional
//! `ticket-board.toml` in the working directory, then `TICKET_BOARD_*`
//! environment variables (a `.env` file is loaded first when present).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use tb_core::{AppError, PaginationMode, PagingDefaults};

pub const ENV_PREFIX: &str = "TICKET_BOARD";
pub const CONFIG_FILE: &str = "ticket-board";

/// Loads `.env` into the process environment if one exists. Call before the
/// logger is initialised so `RUST_LOG` from the file is honoured.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    dotenvy::dotenv().ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub pagination_mode: PaginationMode,
    /// Dataset read by the seeder
    pub seed_path: String,
    /// Base URL the terminal client talks to
    pub server_url: String,
}

impl Settings {
    /// Defaults only. Callers add their own sources on top.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database_url", "sqlite:ticket_board.db?mode=rwc")?
            .set_default("max_connections", 5_i64)?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080_i64)?
            .set_default("default_page_size", 20_i64)?
            .set_default("max_page_size", 100_i64)?
            .set_default("pagination_mode", "cumulative")?
            .set_default("seed_path", "data/tickets.json")?
            .set_default("server_url", "http://127.0.0.1:8080")
    }

    pub fn load() -> Result<Self, AppError> {
        let config = Self::builder()
            .and_then(|builder| {
                builder
                    .add_source(File::with_name(CONFIG_FILE).required(false))
                    .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
                    .build()
            })
            .map_err(|e| AppError::Config(e.to_string()))?;

        let settings = Self::from_config(config)?;
        log::debug!("settings loaded: {settings:?}");
        Ok(settings)
    }

    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if settings.default_page_size == 0 || settings.max_page_size == 0 {
            return Err(AppError::Config("page sizes must be at least 1".into()));
        }
        Ok(settings)
    }

    pub fn paging_defaults(&self) -> PagingDefaults {
        PagingDefaults {
            page_size: self.default_page_size.min(self.max_page_size),
            max_page_size: self.max_page_size,
            mode: self.pagination_mode,
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
