//! Card Import - trading card catalog ingestion service
//!
//! Serves the import API by default. With `--import SOURCE` it runs a single
//! import in the foreground and exits.

use card_import::{
    init_schema, BatchRunner, HttpSourceClient, ImportOrchestrator, PageRange, SourceConfig,
    SourceType, SqliteStore,
};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Trading card import service - resumable catalog imports into SQLite
#[derive(Parser, Debug)]
#[command(name = "card_import")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Port for the import API
    #[arg(long, default_value_t = 8080)]
    web_port: u16,

    /// Run one import for this source (POKEMON, MAGIC, YUGIOH) and exit
    #[arg(long)]
    import: Option<String>,

    /// First page to import (default: continue from the checkpoint)
    #[arg(long, requires = "import")]
    start_page: Option<u32>,

    /// Last page to import (default: until the source is exhausted)
    #[arg(long, requires = "import")]
    end_page: Option<u32>,

    /// Cards per page for sources with a configurable page size
    #[arg(long, default_value_t = 250)]
    page_size: u32,

    /// API key for pokemontcg.io
    #[arg(long)]
    pokemon_api_key: Option<String>,

    /// Scryfall search query used to enumerate cards
    #[arg(long)]
    scryfall_query: Option<String>,
}

/// Returns the default database path: ~/.local/share/card_import/cards.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("card_import")
        .join("cards.db")
        .to_string_lossy()
        .to_string()
}

impl Args {
    fn source_config(&self) -> SourceConfig {
        let mut config = SourceConfig {
            page_size: self.page_size,
            pokemon_api_key: self.pokemon_api_key.clone(),
            ..SourceConfig::default()
        };
        if let Some(query) = &self.scryfall_query {
            config.scryfall_query = query.clone();
        }
        config
    }

    fn page_range(&self) -> PageRange {
        PageRange {
            start: self.start_page,
            end: self.end_page,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting card_import...");
    log::info!("Database path: {}", db_path.display());

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    let conn = match Connection::open(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize database schema: {}", e);
        std::process::exit(1);
    }

    let store = SqliteStore::new(Arc::new(Mutex::new(conn)));
    let client = HttpSourceClient::new(args.source_config());
    let runner = Arc::new(BatchRunner::new(
        Arc::new(client),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));

    match &args.import {
        Some(source) => run_once(&runner, source, args.page_range()).await,
        None => run_server(runner, store, args.web_port).await,
    }
}

/// Run a single import in the foreground
async fn run_once(runner: &BatchRunner, source: &str, range: PageRange) {
    let source: SourceType = match source.parse() {
        Ok(source) => source,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    match runner.run_range(source, range).await {
        Ok(summary) => log::info!(
            "Import of {} finished: {} cards from pages {}..{} ({} total pages known)",
            source,
            summary.records_stored,
            summary.first_page,
            summary.last_page.unwrap_or(summary.first_page),
            summary
                .total_pages
                .map_or_else(|| "no".to_string(), |t| t.to_string())
        ),
        Err(e) => {
            log::error!("Import of {} failed: {}", source, e);
            std::process::exit(1);
        }
    }
}

/// Serve the import API until Ctrl-C
async fn run_server(runner: Arc<BatchRunner>, store: SqliteStore, port: u16) {
    let orchestrator = ImportOrchestrator::new(runner);

    tokio::select! {
        result = card_import::web::serve(orchestrator, Arc::new(store), port) => {
            if let Err(e) = result {
                log::error!("Web server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutting down; running imports resume from their checkpoints on next start");
        }
    }
}
