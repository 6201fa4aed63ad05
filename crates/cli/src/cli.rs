//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// stereocam - dual-sensor stereoscopic capture
#[derive(Parser, Debug)]
#[command(
    name = "stereocam",
    author,
    version,
    about = "Dual-sensor stereoscopic capture engine",
    long_about = "Captures two image sensors in parallel, shows them side by side as one \n\
                  stereo frame, and records composite frames plus per-frame timing.\n\n\
                  Runs against the simulated sensor driver configured in [simulator]."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STEREOCAM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Console log format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STEREOCAM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a capture session
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// List the sensors the driver can see
    Devices(DevicesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "STEREOCAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the parent directory of session output
    #[arg(short, long, env = "STEREOCAM_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Start with recording on
    #[arg(long)]
    pub record: bool,

    /// Stop after this many composite frames (0 = unlimited)
    #[arg(long, default_value = "0", env = "STEREOCAM_MAX_FRAMES")]
    pub max_frames: u64,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "STEREOCAM_TIMEOUT")]
    pub timeout: u64,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "STEREOCAM_METRICS_PORT")]
    pub metrics_port: u16,

    /// Do not read the keyboard (bounded headless runs)
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate
    #[arg(short, long, default_value = "stereocam.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the configuration with every default filled in (TOML)
    #[arg(long)]
    pub normalized: bool,
}

#[derive(Parser, Debug)]
pub struct DevicesArgs {
    /// Configuration file whose [simulator] section defines the bus
    #[arg(short, long, env = "STEREOCAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Console log format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
