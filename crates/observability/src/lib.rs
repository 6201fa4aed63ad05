//! # Observability
//!
//! Tracing and Prometheus metrics for a capture session.
//!
//! ## Features
//!
//! - Tracing initialisation (JSON/Pretty/Compact console output)
//! - Plain-text event log file per session
//! - Prometheus metrics export
//! - Running statistics of display rate and stereo skew
//!
//! ## Usage
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig {
//!     event_log: Some(session.event_log_path()),
//!     ..Default::default()
//! })?;
//!
//! if let Some(frame) = renderer.tick() {
//!     metrics::record_composite_frame(frame.display_fps, frame.skew_ms());
//! }
//! ```

pub mod metrics;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub use crate::metrics::{
    record_channel_health, record_composite_frame, record_frame_recorded, record_offsets,
    MetricsSummary, RunningStats, SessionMetricsAggregator, StatsSummary,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Console level when RUST_LOG is unset
    pub default_log_level: String,
    /// Plain-text event log file (None = console only)
    pub event_log: Option<PathBuf>,
    /// Level written to the event log file
    pub event_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: None,
            default_log_level: "info".to_string(),
            event_log: None,
            event_log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable
    #[default]
    Pretty,
    /// Single line per event
    Compact,
}

/// Initialise tracing (and the Prometheus exporter when a port is set)
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.log_format, filter)];
    if let Some(path) = &config.event_log {
        layers.push(event_log_layer(path, &config.event_log_level)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        install_exporter(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        event_log = ?config.event_log,
        "Observability initialized"
    );

    Ok(())
}

/// Install the Prometheus exporter
fn install_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_filter(filter).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_filter(filter).boxed(),
    }
}

/// ANSI-free text layer appending to `path`
fn event_log_layer(path: &Path, level: &str) -> Result<BoxedLayer> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create event log '{}'", path.display()))?;
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("Invalid event log level '{level}'"))?;

    Ok(fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .with_filter(filter)
        .boxed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.event_log.is_none());
    }

    #[test]
    fn test_event_log_layer_writes_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_log.txt");
        let layer = event_log_layer(&path, "info").unwrap();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(frame = 3, "Displaying frame");
            tracing::debug!("filtered out");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Displaying frame"));
        assert!(contents.contains("frame=3"));
        assert!(!contents.contains("filtered out"));
        assert!(!contents.contains('\u{1b}'));
    }

    #[test]
    fn test_event_log_in_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(event_log_layer(&dir.path().join("a").join("b.txt"), "info").is_err());
    }
}
