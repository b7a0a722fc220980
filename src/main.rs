//! Account service
//!
//! HTTP front for the account registry: sign-up with avatar upload, login,
//! password reset, profile update and deletion.

use account_service::account::{AccountRegistry, CredentialHasher};
use account_service::api::{ApiServer, AppState};
use account_service::assets::AssetStore;
use account_service::catalog::{Catalog, CatalogSeed};
use account_service::config::{ConfigOrigin, ServiceConfig};
use account_service::storage::Storage;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments; each one overrides the config file.
#[derive(Parser, Debug)]
#[clap(name = "account_service", version)]
struct Args {
    /// Path of the TOML config file (created with defaults if missing)
    #[clap(long, default_value = "service.toml")]
    config: String,

    /// HTTP port
    #[clap(long)]
    port: Option<u16>,

    /// RocksDB directory
    #[clap(long)]
    db_path: Option<String>,

    /// Directory holding uploaded avatars
    #[clap(long)]
    uploads_dir: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db_path) = &self.db_path {
            config.storage.db_path = db_path.clone();
        }
        if let Some(uploads_dir) = &self.uploads_dir {
            config.storage.uploads_dir = uploads_dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let (mut config, origin) = ServiceConfig::load_or_default(&args.config)?;
    args.apply(&mut config);

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    match origin {
        ConfigOrigin::File => info!("Config loaded from {}", args.config),
        ConfigOrigin::CreatedDefault => {
            info!("Config file not found at '{}'. Created default.", args.config)
        }
        ConfigOrigin::Default(e) => {
            warn!("Config file not found at '{}' and could not be written ({}). Using defaults.", args.config, e)
        }
    }

    let storage = Arc::new(Storage::open(&config.storage.db_path)?);
    info!("Database: {}", config.storage.db_path);

    let assets = Arc::new(AssetStore::open(
        &config.storage.uploads_dir,
        &config.server.public_base_url,
    )?);
    info!("Uploads: {}", config.storage.uploads_dir);

    let hasher = CredentialHasher::new(&config.security)?;
    let registry = Arc::new(AccountRegistry::open(
        Arc::clone(&storage),
        Arc::clone(&assets),
        hasher,
    )?);

    let catalog = Arc::new(Catalog::new(Arc::clone(&storage)));
    if let Some(seed_path) = &config.storage.catalog_seed {
        let seed = CatalogSeed::load(seed_path)?;
        let written = catalog.seed(&seed)?;
        info!("Seeded {} catalog entries from {}", written, seed_path);
    }

    let state = AppState {
        registry,
        catalog,
        assets,
    };
    ApiServer::new(state, config.listen_addr(), config.server.max_upload_bytes)
        .start(shutdown_signal())
        .await?;

    storage.flush()?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => {
            error!("cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
