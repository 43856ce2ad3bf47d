//! doctype-gate - project-scoped document type catalog

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use doctype_gate::{config::Args, db::CatalogDb, logging, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init_tracing(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  doctype-gate");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Database: {}", args.database_path.display());
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    match args.required_permission() {
        Some(permission) => info!("Required permission: {}", permission),
        None => info!("Required permission: none"),
    }
    info!("======================================");

    let db = Arc::new(CatalogDb::open(&args.database_path)?);
    let state = Arc::new(AppState::new(args, db)?);

    server::run(state).await?;

    Ok(())
}
