//! Console and event-log setup from the global CLI flags.

use std::path::PathBuf;

use anyhow::Result;
use observability::ObservabilityConfig;

use crate::cli::{Cli, LogFormat};

#[derive(Debug, Clone, Copy)]
pub struct LogSettings {
    verbose: u8,
    quiet: bool,
    format: LogFormat,
}

impl LogSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbose: cli.verbose,
            quiet: cli.quiet,
            format: cli.log_format,
        }
    }

    /// Console level when RUST_LOG is unset
    pub fn level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Install the global subscriber; call once
    pub fn init(&self, event_log: Option<PathBuf>, metrics_port: Option<u16>) -> Result<()> {
        observability::init_with_config(ObservabilityConfig {
            log_format: self.format.into(),
            metrics_port,
            default_log_level: self.level().to_string(),
            event_log,
            // per-frame capture lines are debug; keep them out of the file unless asked
            event_log_level: if self.verbose > 0 { "debug" } else { "info" }.to_string(),
        })
    }
}
