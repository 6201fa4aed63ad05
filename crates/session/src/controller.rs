//! SessionController - discovery, startup, run loop and teardown

use std::sync::Arc;
use std::time::{Duration, Instant};

use capture::{OffsetAdjuster, SensorChannel};
use contracts::{CameraDriver, DeviceId, OperatorCommand, SessionBlueprint, Side};
use recorder::{DataLog, RecordingPipeline};
use sync_engine::{CompositeRenderer, SoftwareSurface, SynchronizationGate};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

use crate::context::{Flow, SessionContext};
use crate::error::{Result, SessionError};
use crate::output::SessionOutput;
use crate::stats::SessionStats;

/// Operator key bindings
pub const INSTRUCTIONS: &str = "\
*** INSTRUCTIONS ***
  Esc   leave the session
  F     toggle fullscreen
  R     toggle recording
  Up    increase stereo spacing
  Down  decrease stereo spacing";

/// Optional bounds on a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Stop after this many composite frames
    pub max_frames: Option<u64>,
    /// Stop after this much wall time
    pub timeout: Option<Duration>,
    /// Overrides `output.record_on_start`
    pub record: Option<bool>,
}

/// Which bus device feeds which side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideAssignment {
    pub left: DeviceId,
    pub right: DeviceId,
}

pub struct SessionController {
    blueprint: SessionBlueprint,
    driver: Arc<dyn CameraDriver>,
    output: SessionOutput,
    limits: RunLimits,
}

impl SessionController {
    pub fn new(
        blueprint: SessionBlueprint,
        driver: Arc<dyn CameraDriver>,
        output: SessionOutput,
    ) -> Self {
        Self {
            blueprint,
            driver,
            output,
            limits: RunLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn output(&self) -> &SessionOutput {
        &self.output
    }

    /// Enumerate the bus and decide which device is LEFT
    ///
    /// Device 0 is LEFT when its serial matches the configured left serial,
    /// otherwise the two indices are swapped.
    #[instrument(name = "session_assign_sides", skip(self))]
    pub fn assign_sides(&self) -> Result<SideAssignment> {
        let ids = self.driver.enumerate()?;
        info!(count = ids.len(), "Cameras detected");
        if ids.len() < 2 {
            error!(found = ids.len(), "Too few cameras connected");
            return Err(SessionError::TooFewDevices { found: ids.len() });
        }
        if ids.len() > 2 {
            warn!(count = ids.len(), "More than two cameras connected, using the first two");
        }

        let first = self.driver.probe(&ids[0])?;
        let left_serial = self.blueprint.serial_for(Side::Left);
        let assignment = if first.serial_number == left_serial {
            SideAssignment {
                left: ids[0].clone(),
                right: ids[1].clone(),
            }
        } else {
            SideAssignment {
                left: ids[1].clone(),
                right: ids[0].clone(),
            }
        };
        info!(
            device0_serial = first.serial_number,
            left = %assignment.left,
            right = %assignment.right,
            "Sides assigned"
        );
        Ok(assignment)
    }

    /// Connect and start both channels, LEFT first
    ///
    /// On any failure whatever was opened is closed again.
    #[instrument(name = "session_connect_rig", skip(self))]
    pub fn connect_rig(
        &self,
        assignment: &SideAssignment,
    ) -> Result<(Arc<SensorChannel>, Arc<SensorChannel>)> {
        let capture = &self.blueprint.capture;
        let left = SensorChannel::new(Side::Left, capture.roi_for(Side::Left), capture.offset_step);
        let right =
            SensorChannel::new(Side::Right, capture.roi_for(Side::Right), capture.offset_step);

        let opened = (|| -> Result<()> {
            left.connect(self.driver.as_ref(), &assignment.left)?;
            right.connect(self.driver.as_ref(), &assignment.right)?;
            left.start()?;
            right.start()?;
            Ok(())
        })();

        if let Err(e) = opened {
            error!(error = %e, "Rig startup failed");
            release(&left);
            release(&right);
            return Err(e);
        }
        Ok((left, right))
    }

    /// Run a whole session until Quit, a limit, or a fatal error
    ///
    /// Both channels are stopped and disconnected, the recorder drained and
    /// the data log closed on every exit path after startup.
    #[instrument(name = "session_run", skip(self, commands), fields(session = %self.output.base_name()))]
    pub async fn run(self, mut commands: mpsc::Receiver<OperatorCommand>) -> Result<SessionStats> {
        let started = Instant::now();
        let assignment = self.assign_sides()?;
        let (left, right) = self.connect_rig(&assignment)?;

        let data_log = match DataLog::create(self.output.data_log_path()) {
            Ok(log) => log,
            Err(e) => {
                release(&left);
                release(&right);
                return Err(e.into());
            }
        };

        let display = &self.blueprint.display;
        let renderer = CompositeRenderer::with_session_start(
            SynchronizationGate::new(left, right),
            Box::new(SoftwareSurface::new(display.width, display.height)),
            display.layout,
            started,
        );
        let recording = self
            .limits
            .record
            .unwrap_or(self.blueprint.output.record_on_start);
        let mut context = SessionContext::new(
            renderer,
            OffsetAdjuster::new(self.blueprint.capture.adjust_magnitude),
            RecordingPipeline::bitmaps(self.output.dir(), self.output.base_name()),
            data_log,
            recording,
        );
        if display.start_fullscreen {
            context.toggle_fullscreen();
        }

        info!(
            dir = %self.output.dir().display(),
            max_frames = ?self.limits.max_frames,
            timeout = ?self.limits.timeout,
            "Session running"
        );
        let outcome = self.event_loop(&mut context, &mut commands).await;
        let stats = context.shutdown(started.elapsed()).await;

        if let Err(ref e) = outcome {
            error!(error = %e, "Session aborted");
        }
        outcome.map(|()| stats)
    }

    async fn event_loop(
        &self,
        context: &mut SessionContext,
        commands: &mut mpsc::Receiver<OperatorCommand>,
    ) -> Result<()> {
        let period = Duration::from_millis(self.blueprint.display.tick_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = async {
            match self.limits.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        let mut commands_open = true;

        loop {
            tokio::select! {
                biased;

                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if context.on_command(command).await? == Flow::Quit {
                            return Ok(());
                        }
                    }
                    None => {
                        info!("Operator input closed");
                        commands_open = false;
                    }
                },
                _ = &mut deadline => {
                    info!(frames = context.frames_presented(), "Session timeout reached");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if context.on_tick().await.is_none() {
                        continue;
                    }
                    if let Some(max) = self.limits.max_frames {
                        if context.frames_presented() >= max {
                            info!(frames = max, recording = context.is_recording(), "Reached max frames limit");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

fn release(channel: &SensorChannel) {
    if let Err(e) = channel.disconnect() {
        warn!(side = %channel.side(), error = %e, "Channel release failed");
    }
}
