//! `serve` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, GatewayConfig};
use gcp_client::GcpClients;
use http_api::GatewayServer;
use ingestion::IngestCoordinator;
use tracing::{info, warn};

use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let mut config = super::load_config(&args.config)?;

    // Apply CLI overrides
    if let Some(bind) = args.bind {
        info!(bind = %bind, "Overriding bind address from CLI");
        config.server.bind_addr = bind;
    }
    if let Some(concurrency) = args.publish_concurrency {
        info!(concurrency, "Overriding publish concurrency from CLI");
        config.pipeline.publish_concurrency = concurrency;
    }
    ConfigLoader::validate(&config).context("Invalid CLI overrides")?;

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let clients = GcpClients::from_config(&config).context("Failed to create GCP clients")?;
    let coordinator = IngestCoordinator::from_config(
        Arc::new(clients.publisher),
        Arc::new(clients.inserter),
        &config,
    );
    let metrics = coordinator.metrics();

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(
        bind = %config.server.bind_addr,
        publish_concurrency = config.pipeline.publish_concurrency,
        status_policy = ?config.pipeline.status_policy,
        "Starting gateway..."
    );

    GatewayServer::new(Arc::new(coordinator), &config.gcp.project_id)
        .serve(listener, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    let snapshot = metrics.snapshot();
    info!(
        batches = snapshot.batches(),
        records = snapshot.records,
        publish_failures = snapshot.publish_failures,
        insert_errors = snapshot.insert_errors,
        "Gateway stopped"
    );
    println!("\n{snapshot}");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, draining in-flight requests...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &GatewayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("GCP:");
    println!("  Project: {}", config.gcp.project_id);
    println!("  Dataset: {}", config.gcp.dataset_id);
    match &config.gcp.credentials_path {
        Some(path) => println!("  Credentials: {}", path.display()),
        None => println!("  Credentials: (ambient)"),
    }
    println!("\nPub/Sub:");
    println!("  Topic: {}", config.pubsub.topic_id);
    println!("  Endpoint: {}", config.pubsub.endpoint);
    println!("\nBigQuery:");
    println!("  Table: {}", config.full_table_id());
    println!("  Endpoint: {}", config.bigquery.endpoint);
    println!("\nServer:");
    println!("  Bind: {}", config.server.bind_addr);
    println!(
        "  Publish concurrency: {}",
        config.pipeline.publish_concurrency
    );
    println!("  Status policy: {:?}", config.pipeline.status_policy);
    println!();
}
