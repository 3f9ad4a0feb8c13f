//! Prometheus metrics for the agent.
//!
//! Provides metrics for:
//! - Refresh outcomes and the size of the local store
//! - Sweeps and per-resource deletion outcomes
//! - Keep-alive pings
//!
//! Every recording function compiles to a no-op without the `prometheus`
//! feature.

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, gauge};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Global Prometheus handle for the metrics endpoint.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
#[cfg(feature = "prometheus")]
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record a refresh attempt and, on success, the resulting store size.
pub fn record_refresh(status: &'static str, store_size: Option<usize>) {
    #[cfg(feature = "prometheus")]
    {
        counter!("postsweep_refresh_total", "status" => status).increment(1);
        if let Some(size) = store_size {
            gauge!("postsweep_store_size").set(size as f64);
        }
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (status, store_size);
    }
}

/// Record a completed sweep and the store size it left behind.
pub fn record_sweep(store_size: usize) {
    #[cfg(feature = "prometheus")]
    {
        counter!("postsweep_sweep_total").increment(1);
        gauge!("postsweep_store_size").set(store_size as f64);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = store_size;
    }
}

/// Record the outcome of a single remote delete.
pub fn record_deletion(status: &'static str) {
    #[cfg(feature = "prometheus")]
    {
        counter!("postsweep_deletions_total", "status" => status).increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = status;
    }
}

/// Record a keep-alive ping.
pub fn record_keepalive(status: &'static str) {
    #[cfg(feature = "prometheus")]
    {
        counter!("postsweep_keepalive_total", "status" => status).increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = status;
    }
}

/// Metrics initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),

    #[error("Failed to set up metrics: {0}")]
    Setup(String),
}
