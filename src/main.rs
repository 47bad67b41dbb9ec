//! Taskboard REST server
//!
//! Projects, tasks with an append-only state history, comments, and
//! language-model assisted day plans, replies, descriptions and proposals.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use taskboard::api::{AppState, start_server};
use taskboard::assist::Assistant;
use taskboard::auth::TokenIssuer;
use taskboard::cli::{Cli, Command};
use taskboard::config::{Config, ConfigLoader, ConfigPaths};
use taskboard::db::Database;
use taskboard::generation::GeneratorRegistry;
use taskboard::logging::{LogTarget, init_logging};
use taskboard::prompts::{PromptLibrary, PromptsConfig};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit --config replaces the project and user tiers
    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit_file(config_path);
    }
    let mut loader = ConfigLoader::load_with_paths(paths)?;
    for source in loader.sources() {
        debug!(path = %source.display(), "Loaded config file");
    }
    cli.apply_overrides(loader.config_mut());
    let prompts = PromptsConfig::from_paths(&loader.paths);
    let config = loader.into_config();

    let db = open_database(&config)?;

    match cli.command() {
        Command::Migrate => {
            info!(path = %config.server.db_path.display(), "Database is up to date");
        }
        Command::Serve => run_server(config, prompts, db).await?,
    }

    Ok(())
}

/// Open the database, creating its directory first. Migrations run on open.
fn open_database(config: &Config) -> Result<Arc<Database>> {
    let db_path = &config.server.db_path;
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display()))?;
    }
    let db = Database::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    Ok(Arc::new(db))
}

async fn run_server(config: Config, prompts: PromptsConfig, db: Arc<Database>) -> Result<()> {
    let generators = Arc::new(GeneratorRegistry::from_config(&config.generation));
    let tokens = Arc::new(TokenIssuer::from_config(&config.auth));
    let prompts = Arc::new(PromptLibrary::load(&prompts));
    let assistant = Assistant::new(Arc::clone(&db), generators, prompts);

    let listen = config.listen_addr();
    let addr: SocketAddr = tokio::net::lookup_host(&listen)
        .await
        .with_context(|| format!("resolving listen address {}", listen))?
        .next()
        .with_context(|| format!("no address for {}", listen))?;
    let state =
        AppState::new(db, assistant, tokens).with_password_cost(config.auth.bcrypt_cost);
    let (shutdown_tx, bound_addr) = start_server(state, addr).await?;

    info!(
        "Taskboard v{} serving on http://{}",
        env!("CARGO_PKG_VERSION"),
        bound_addr
    );

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt, shutting down");
    let _ = shutdown_tx.send(());
    Ok(())
}
