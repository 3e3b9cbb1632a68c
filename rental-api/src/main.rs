use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rental_api::{AppState, ConfigOverrides, ServerConfig, router};
use rental_core::db::{DbConfig, RepositoryRegistry};
use rental_db_sqlite::SqliteRepositoryFactory;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Rental income tax simulator and profitability projection API.
///
/// Opens the configured store, loads every fiscal year schedule it holds,
/// and serves the JSON API.
#[derive(Debug, Parser)]
struct Cli {
    /// TOML configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Socket address to listen on, e.g. `0.0.0.0:8080`.
    #[arg(long)]
    bind: Option<String>,

    /// Database backend to use.
    #[arg(long)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `rental.db`) or `:memory:`.
    #[arg(long)]
    database: Option<String>,

    /// Fiscal year used when a request does not name one.
    #[arg(long)]
    default_year: Option<i32>,

    /// Log filter directive, e.g. `info,rental_core=debug`.
    #[arg(long)]
    log: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind: self.bind.clone(),
            backend: self.backend.clone(),
            database: self.database.clone(),
            default_year: self.default_year,
            log: self.log.clone(),
        }
    }
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to the configured directive otherwise.
/// * Strips timestamps and target names to keep output clean.
fn init_tracing(fallback: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref(), cli.overrides())
        .context("failed to load configuration")?;

    init_tracing(&config.log);
    debug!(?config, "configuration resolved");

    let registry = RepositoryRegistry::new().with(Box::new(SqliteRepositoryFactory));
    let db_config = DbConfig::new(&config.backend, &config.database);
    let repository = registry
        .create(&db_config)
        .await
        .with_context(|| format!("failed to open {} database '{}'", config.backend, config.database))?;

    let state = AppState::load(Arc::from(repository), config.default_year)
        .await
        .context("failed to load fiscal configurations")?;

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(
        address = %config.bind,
        default_year = config.default_year,
        "rental API listening"
    );

    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}
