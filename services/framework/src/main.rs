//! ArangoDB Marathon framework
//!
//! Runs alongside the cluster it manages. Three activities run concurrently:
//!
//! - **Reconciliation loop**: makes sure the cluster's Marathon group exists
//! - **Supervision loop**: sends the initial cluster size to a coordinator
//! - **Control-plane API**: `/v2/status` and `/v2/shutdown`

use std::sync::Arc;
use std::time::Duration;

use amf_descriptor::GroupDescriptor;
use amf_framework::{
    api,
    config::{Cli, Command, Config},
    marathon::{http_client, MarathonClient},
    state::AppState,
    CoordinatorAdmin, DeploymentReconciler, InitSupervisor, TaskDiscovery,
};
use amf_reconcile::{wait_for_shutdown, Ticker};
use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    if let Some(Command::Render) = cli.command {
        let descriptor = GroupDescriptor::for_cluster(&config.cluster);
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    // Initialize tracing (prefer RUST_LOG, fallback to --log-level)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting ArangoDB Marathon framework");
    info!(
        cluster = %config.cluster.name(),
        marathon_url = %config.cluster.marathon_url(),
        listen_addr = %config.listen_addr,
        "Configuration loaded"
    );

    let spec = Arc::new(config.cluster.clone());
    let http = http_client(config.http_timeout)?;
    let marathon = MarathonClient::new(http.clone(), spec.marathon_url());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Reconciliation loop
    let reconcile_handle = tokio::spawn({
        let mut reconciler = DeploymentReconciler::new(marathon.clone(), Arc::clone(&spec));
        let ticker = Ticker::new(config.reconcile_interval, shutdown_rx.clone());
        async move { ticker.run(&mut reconciler).await }
    });

    // Supervision loop
    let supervise_handle = tokio::spawn({
        let discovery = TaskDiscovery::new(marathon.clone(), config.discovery, shutdown_rx.clone());
        let mut supervisor =
            InitSupervisor::new(Arc::clone(&spec), discovery, CoordinatorAdmin::new(http));
        let ticker = Ticker::new(config.supervise_interval, shutdown_rx.clone());
        async move { ticker.run(&mut supervisor).await }
    });

    // Control-plane API
    let state = AppState::new(marathon, spec.group_id(), shutdown_tx.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Serving HTTP/REST API");

    let server_handle = tokio::spawn({
        let mut shutdown_rx = shutdown_rx.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    wait_for_shutdown(&mut shutdown_rx).await;
                    info!("HTTP server shutting down");
                })
                .await
        }
    });

    // Wait for Ctrl+C or a shutdown request
    let mut shutdown_wait = shutdown_rx.clone();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = wait_for_shutdown(&mut shutdown_wait) => {
            info!("Shutdown requested via API");
        }
    }

    // Signal shutdown to all workers
    shutdown_tx.send_replace(true);

    info!("Waiting for workers to shut down...");
    let shutdown_timeout = Duration::from_secs(10);

    match tokio::time::timeout(shutdown_timeout, server_handle).await {
        Ok(Ok(Ok(()))) => info!("Server exited normally"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server error"),
        Ok(Err(e)) => error!(error = %e, "Server task panicked"),
        Err(_) => warn!("Server did not shut down in time"),
    }

    if tokio::time::timeout(shutdown_timeout, reconcile_handle).await.is_err() {
        warn!("Reconciliation loop did not shut down in time");
    }

    // Discovery may be mid-request; its own timeout bounds this
    if tokio::time::timeout(shutdown_timeout, supervise_handle).await.is_err() {
        warn!("Supervision loop did not shut down in time");
    }

    info!("Framework shutdown complete");
    Ok(())
}
