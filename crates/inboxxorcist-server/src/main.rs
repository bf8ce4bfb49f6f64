//! InboxXorcist Server
//!
//! Spam classification service for single emails, batches, and mbox archives.

use anyhow::Result;
use clap::Parser;
use inboxxorcist_classifiers::ClassifierHandle;
use inboxxorcist_server::{create_router, AppState, Cli, ServiceConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting InboxXorcist server");

    let config = ServiceConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Classifier backend: {:?}", config.classifier.backend);
    info!("Model path: {}", config.classifier.model_path.display());
    info!("Allowed origins: {}", config.cors.origins().join(", "));

    let metrics_handle = init_metrics()?;

    let classifier = ClassifierHandle::load(&config.classifier).await;
    if !classifier.is_loaded() {
        warn!("No classifier loaded; prediction endpoints will answer 503");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.listen, config.server.port).parse()?;
    let state = AppState::new(config, classifier, Some(metrics_handle))?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("inboxxorcist=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("inboxxorcist=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "inboxxorcist_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!(
        "inboxxorcist_classifications_total",
        "Total number of classified texts by label"
    );
    metrics::describe_counter!(
        "inboxxorcist_errors_total",
        "Total number of error responses by kind"
    );
    metrics::describe_histogram!(
        "inboxxorcist_classify_latency_us",
        metrics::Unit::Microseconds,
        "Classifier backend latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
