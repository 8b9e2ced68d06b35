//! Boot — logging init, config load and validation, catalog and sink setup.

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::{AppConfig, ConfigError};
use crate::registry::Catalog;
use crate::sink::JsonTableSink;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statsource=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate config, read the entity catalog, and open the table
/// sink shared by every worker.
///
/// Returns `(AppConfig, Catalog, JsonTableSink)` on success.
pub async fn boot() -> Result<(AppConfig, Arc<Catalog>, Arc<JsonTableSink>), Box<dyn std::error::Error>> {
    info!("Starting statsource v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        ConfigError::Invalid(e)
    })?;
    info!(
        "Loaded configuration: servers={}, poll_interval={}ms",
        config.servers.len(),
        config.poll_interval_ms
    );

    let catalog = Catalog::from_file(Path::new(&config.catalog_path)).map_err(|e| {
        error!("Failed to load catalog: {}", e);
        e
    })?;
    info!("Loaded entity catalog from {}", config.catalog_path);

    let sink = JsonTableSink::new(&config.output_dir).map_err(|e| {
        error!("Failed to open output directory: {}", e);
        e
    })?;
    info!("Writing match tables to {}", config.output_dir);

    Ok((config, Arc::new(catalog), Arc::new(sink)))
}
