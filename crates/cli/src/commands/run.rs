//! `run` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::OperatorCommand;
use sensor_driver::MockDriver;
use session::{RunLimits, SessionController, SessionOutput, INSTRUCTIONS};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::input::KeyboardInput;
use crate::logging::LogSettings;

/// Execute the `run` command
pub async fn run_session(args: &RunArgs, logging: &LogSettings) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;

    if let Some(ref dir) = args.output_dir {
        blueprint.output.base_dir = dir.display().to_string();
    }
    config_loader::ConfigLoader::validate(&blueprint).context("Invalid configuration")?;

    let output = SessionOutput::create(
        &blueprint.output.base_dir,
        &blueprint.output.session_name_format,
    )
    .context("Failed to create session output directory")?;

    // the event log lives in the session directory, so logging starts here
    logging.init(
        Some(output.event_log_path()),
        (args.metrics_port != 0).then_some(args.metrics_port),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        session = output.base_name(),
        dir = %output.dir().display(),
        left_serial = blueprint.rig.left_serial,
        right_serial = blueprint.rig.right_serial,
        "stereocam starting"
    );

    let limits = RunLimits {
        max_frames: (args.max_frames != 0).then_some(args.max_frames),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        record: args.record.then_some(true),
    };
    let driver = Arc::new(MockDriver::new(blueprint.simulator.clone()));
    let controller = SessionController::new(blueprint, driver, output).with_limits(limits);

    let (tx, rx) = mpsc::channel::<OperatorCommand>(32);
    let keyboard = if args.no_input {
        None
    } else {
        println!("{INSTRUCTIONS}\n");
        Some(KeyboardInput::spawn(tx.clone())?)
    };
    let signal = tokio::spawn(quit_on_signal(tx));

    let result = controller.run(rx).await;
    signal.abort();
    drop(keyboard);

    let stats = result.context("Session failed")?;
    info!(
        composite_frames = stats.composite_frames,
        recorded = stats.recorder.written,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Session completed"
    );
    stats.print_summary();
    Ok(())
}

/// Turn Ctrl+C / SIGTERM into a Quit command so teardown still runs
async fn quit_on_signal(commands: mpsc::Sender<OperatorCommand>) {
    shutdown_signal().await;
    warn!("Received shutdown signal, stopping session...");
    let _ = commands.send(OperatorCommand::Quit).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
