//! Serve — one worker task per configured server, until shutdown.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::checkpoint::ConfigCheckpoint;
use crate::conf::{AppConfig, ServerConfig};
use crate::events::Context;
use crate::registry::{Catalog, Registry};
use crate::runtime::stop::shutdown_signal;
use crate::sink::TableSink;
use crate::source::{LogLayout, Pipeline, Worker, WorkerError};

/// Servers to run, with their index in the config file. `only` narrows the
/// set to one server id.
pub fn select_servers(config: &AppConfig, only: Option<i64>) -> Vec<(usize, &ServerConfig)> {
    config
        .servers
        .iter()
        .enumerate()
        .filter(|(_, server)| only.map_or(true, |id| server.id == id))
        .collect()
}

/// Build the worker for `servers[index]`; its checkpoints go back into the
/// file at `config_path`.
pub fn build_worker(
    config: &AppConfig,
    index: usize,
    server: &ServerConfig,
    catalog: &Catalog,
    sink: Arc<dyn TableSink>,
    config_path: &Path,
    checkpoint_lock: Arc<Mutex<()>>,
) -> Result<Worker, Box<dyn std::error::Error>> {
    let checkpoint = Arc::new(ConfigCheckpoint::new(config_path, index, checkpoint_lock));
    let ctx = Context::new(server.id, Registry::from_catalog(catalog), sink, checkpoint)?;
    Ok(Worker::new(
        Pipeline::new(ctx),
        LogLayout::for_server(config, server),
        server.checkpoint(),
        Duration::from_millis(config.poll_interval_ms),
    ))
}

/// Spawn every selected worker and wait for them, or for Ctrl+C.
///
/// A worker that fails stops alone; the others keep running.
pub async fn serve(
    config: AppConfig,
    catalog: Arc<Catalog>,
    sink: Arc<dyn TableSink>,
    only: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selected = select_servers(&config, only);
    if selected.is_empty() {
        error!("No configured server matches id {:?}", only);
        return Err(format!("no configured server with id {:?}", only).into());
    }

    let config_path = AppConfig::config_path();
    let checkpoint_lock = Arc::new(Mutex::new(()));
    let cancel = CancellationToken::new();
    let mut workers: JoinSet<(i64, Result<(), WorkerError>)> = JoinSet::new();

    for (index, server) in selected {
        let worker = build_worker(
            &config,
            index,
            server,
            &catalog,
            Arc::clone(&sink),
            &config_path,
            Arc::clone(&checkpoint_lock),
        )?;
        let server_id = server.id;
        let token = cancel.child_token();
        info!(
            "Starting worker for server {} (log dir: {}, checkpoint: {})",
            server_id,
            server.log_dir(&config.log_subdir).display(),
            if server.last_timestamp.is_empty() {
                "none"
            } else {
                &server.last_timestamp
            }
        );
        workers.spawn(async move { (server_id, worker.run(token).await) });
    }

    info!("========================================");
    info!("statsource is running {} worker(s)", workers.len());
    info!("Press Ctrl+C to shutdown gracefully");
    info!("========================================");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut failed = 0usize;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                cancel.cancel();
                break;
            }
            joined = workers.join_next() => match joined {
                Some(result) => failed += report(result),
                None => break,
            },
        }
    }

    while let Some(result) = workers.join_next().await {
        failed += report(result);
    }

    info!("Shutdown complete");
    if failed > 0 {
        return Err(format!("{} worker(s) stopped with an error", failed).into());
    }
    Ok(())
}

/// Log how a worker ended; returns 1 when it failed.
fn report(result: Result<(i64, Result<(), WorkerError>), tokio::task::JoinError>) -> usize {
    match result {
        Ok((server_id, Ok(()))) => {
            info!(server_id, "worker stopped");
            0
        }
        Ok((server_id, Err(e))) => {
            error!(server_id, error = %e, "worker failed");
            1
        }
        Err(e) => {
            warn!(error = %e, "worker task aborted");
            1
        }
    }
}
