use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kessan_core::browser::WebDriverConnector;
use kessan_core::{
    load_config, validate_config, CodeRegistry, HttpCodeRegistry, Ledger, Orchestrator,
    SqliteLedger,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("KESSAN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Database path: {:?}", config.database.path);
    info!("Storage base: {:?}", config.storage.base_dir);

    tokio::fs::create_dir_all(&config.storage.base_dir)
        .await
        .context("Failed to create storage base directory")?;
    tokio::fs::create_dir_all(&config.storage.download_dir)
        .await
        .context("Failed to create download directory")?;

    let ledger: Arc<dyn Ledger> =
        Arc::new(SqliteLedger::new(&config.database.path).context("Failed to open ledger")?);
    info!("Ledger initialized");

    let registry: Arc<dyn CodeRegistry> = Arc::new(
        HttpCodeRegistry::new(config.registry.clone())
            .context("Failed to create registry client")?,
    );

    let connector = WebDriverConnector::new(
        config.webdriver.clone(),
        config.storage.download_dir.clone(),
    );

    let orchestrator = Orchestrator::new(&config, ledger, registry);
    orchestrator
        .run(&connector)
        .await
        .context("Pipeline run failed")?;

    Ok(())
}
