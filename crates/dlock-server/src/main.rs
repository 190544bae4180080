//! Main entry point for the dlock lock node.
//!
//! Sets up the lock server with a fresh epoch, starts lock maintenance, and
//! serves the lock RPC surface until a shutdown signal arrives.

use std::sync::Arc;

use dlock_core::{HttpLivenessVerifier, HttpVerifierConfig, LockMaintenance, LockServer};
use dlock_server::{model::Configuration, startup};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    dlock_core::metrics::describe_metrics();

    // A restart always produces a new epoch; nothing from a previous run survives
    let lock_server = Arc::new(LockServer::new());
    info!(epoch = %lock_server.epoch(), "Lock server initialized");

    let verifier = Arc::new(HttpLivenessVerifier::new(HttpVerifierConfig {
        connect_timeout_ms: configuration.probe_connect_timeout().as_millis() as u64,
        timeout_ms: configuration.probe_timeout().as_millis() as u64,
    })?);

    let shutdown_signal = startup::wait_for_shutdown_signal().await;

    let maintenance_handle = LockMaintenance::new(
        lock_server.clone(),
        verifier,
        configuration.maintenance_staleness(),
    )
    .spawn(configuration.maintenance_interval(), shutdown_signal.subscribe());

    let address = configuration.server_address();
    let port = configuration.server_port();
    let http_server = startup::lock_http_server(
        lock_server,
        address.clone(),
        port,
        configuration.server_workers(),
    )?;
    info!(address = %address, port, "Lock node listening");

    let http_handle = http_server.handle();
    let mut http_shutdown = shutdown_signal.subscribe();
    tokio::spawn(async move {
        let _ = http_shutdown.recv().await;
        info!("Stopping HTTP server");
        http_handle.stop(true).await;
    });

    if let Err(e) = http_server.await {
        error!("HTTP server error: {}", e);
    }

    // Stop maintenance as well if the server ended on its own
    shutdown_signal.shutdown();
    if let Err(e) = maintenance_handle.await {
        error!("Lock maintenance task failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
