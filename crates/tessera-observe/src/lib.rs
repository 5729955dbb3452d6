//! # Tessera Observe - Observability Layer
//!
//! Centralized logging and metrics bootstrap for the Tessera wallet.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogProfile};

/// Initialize the Prometheus metrics exporter
pub fn init_metrics() -> Result<()> {
    PrometheusBuilder::new()
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    // Register descriptions for the query coordination metrics
    tessera_quorum::metrics::init_quorum_metrics();

    tracing::info!("Metrics exporter initialized");

    Ok(())
}

/// Initialize the full observability stack
pub fn init() -> Result<()> {
    init_logging(LogConfig::default())?;
    init_metrics()?;

    Ok(())
}
