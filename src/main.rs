//! Credit Scoring Service - Main Entry Point
//!
//! Loads the credit default model once and serves predictions over HTTP.

use anyhow::{Context, Result};
use credit_scoring_service::{
    api::{router, AppState},
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::OnnxClassifier,
    service::InferenceService,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;

    info!("Starting Credit Scoring Service");
    info!(
        model = %config.model.path,
        feature_count = config.model.feature_count,
        threshold = config.decision.threshold,
        "Configuration loaded"
    );

    // A missing or corrupt artifact is fatal
    let classifier = OnnxClassifier::from_config(&config.model)
        .context("Failed to load the scoring model")?;

    let metrics = Arc::new(ServiceMetrics::new());
    let service = InferenceService::with_metrics(
        Arc::new(classifier),
        config.model.feature_count,
        metrics.clone(),
    );

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = Arc::new(AppState::new(service, &config.server.static_dir));
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Prediction API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("credit_scoring_service={}", logging.level))?,
    };

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl+c");
    }
    info!("Shutdown signal received");
}
