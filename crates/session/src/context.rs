//! State shared by the render tick and the command handler

use std::sync::Arc;
use std::time::{Duration, Instant};

use capture::{OffsetAdjuster, SensorChannel};
use contracts::{OperatorCommand, Side};
use observability::SessionMetricsAggregator;
use recorder::{DataLog, RecordingPipeline};
use sync_engine::{CompositeFrame, CompositeRenderer};
use tracing::{info, warn};

use crate::error::Result;
use crate::stats::SessionStats;

/// What the loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

pub(crate) struct SessionContext {
    renderer: CompositeRenderer,
    adjuster: OffsetAdjuster,
    recorder: RecordingPipeline,
    data_log: DataLog,
    recording: bool,
    data_log_failures: u64,
    display_metrics: SessionMetricsAggregator,
}

impl SessionContext {
    pub(crate) fn new(
        renderer: CompositeRenderer,
        adjuster: OffsetAdjuster,
        recorder: RecordingPipeline,
        data_log: DataLog,
        recording: bool,
    ) -> Self {
        if recording {
            info!(dir = %recorder.dir().display(), "Recording on");
        }
        Self {
            renderer,
            adjuster,
            recorder,
            data_log,
            recording,
            data_log_failures: 0,
            display_metrics: SessionMetricsAggregator::new(),
        }
    }

    fn left(&self) -> &SensorChannel {
        self.renderer.gate().left()
    }

    fn right(&self) -> &SensorChannel {
        self.renderer.gate().right()
    }

    fn channels(&self) -> (Arc<SensorChannel>, Arc<SensorChannel>) {
        let gate = self.renderer.gate();
        (gate.left().clone(), gate.right().clone())
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording
    }

    pub(crate) fn frames_presented(&self) -> u64 {
        self.renderer.frames_presented()
    }

    pub(crate) fn toggle_fullscreen(&mut self) -> bool {
        self.renderer.toggle_fullscreen()
    }

    /// One render tick; per-frame failures are logged and skipped
    pub(crate) async fn on_tick(&mut self) -> Option<CompositeFrame> {
        let frame = self.renderer.tick()?;

        if let Err(e) = self.data_log.append(&frame.record) {
            self.data_log_failures += 1;
            warn!(frame = frame.frame_number, error = %e, "Data log append failed");
        }

        let skew_ms = frame.skew_ms();
        observability::record_composite_frame(frame.display_fps, skew_ms);
        self.display_metrics.update(frame.display_fps, skew_ms);
        for (side, fps, channel) in [
            (Side::Left, frame.left.fps, self.left()),
            (Side::Right, frame.right.fps, self.right()),
        ] {
            let m = channel.metrics();
            observability::record_channel_health(
                side,
                fps,
                m.frames_published,
                m.conversion_failures + m.frames_discarded,
            );
        }

        if self.recording {
            self.record(&frame).await;
        }
        Some(frame)
    }

    async fn record(&mut self, frame: &CompositeFrame) {
        let started = Instant::now();
        let (width, height) = self.renderer.surface_size();
        let pixels = self.renderer.read_pixels();
        let job = self.recorder.job(frame.frame_number, width, height, pixels);
        if let Err(e) = self.recorder.submit(job).await {
            warn!(frame = frame.frame_number, error = %e, "Recording submission failed");
            return;
        }
        let wait_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_frame_recorded(wait_ms);
        self.display_metrics.record_submission(wait_ms);
    }

    /// Apply one operator command
    ///
    /// A rejected offset adjustment is returned as an error: the channel that
    /// rejected it has stopped capturing.
    pub(crate) async fn on_command(&mut self, command: OperatorCommand) -> Result<Flow> {
        info!("{}", command.describe());
        match command {
            OperatorCommand::Quit => return Ok(Flow::Quit),
            OperatorCommand::ToggleFullscreen => {
                let fullscreen = self.toggle_fullscreen();
                info!(fullscreen, "Display mode changed");
            }
            OperatorCommand::ToggleRecording => {
                self.recording = !self.recording;
                if self.recording {
                    info!(dir = %self.recorder.dir().display(), "Recording on");
                } else {
                    // the write in flight still completes
                    info!("Recording off");
                }
            }
            OperatorCommand::AdjustOffset(direction) => {
                // restarting a stream joins its frame thread
                let adjuster = self.adjuster;
                let (left, right) = self.channels();
                let change =
                    tokio::task::spawn_blocking(move || adjuster.apply(direction, &left, &right)).await??;
                observability::record_offsets(change.left, change.right);
            }
        }
        Ok(Flow::Continue)
    }

    /// Stop both channels, wait for the recorder and close the data log
    pub(crate) async fn shutdown(self, duration: Duration) -> SessionStats {
        let Self {
            renderer,
            mut recorder,
            data_log,
            data_log_failures,
            display_metrics,
            ..
        } = self;
        let (left, right) = (renderer.gate().left().clone(), renderer.gate().right().clone());

        let channels = [left.clone(), right.clone()];
        let released = tokio::task::spawn_blocking(move || {
            for channel in &channels {
                if let Err(e) = channel.disconnect() {
                    warn!(side = %channel.side(), error = %e, "Channel shutdown failed");
                }
            }
        })
        .await;
        if let Err(e) = released {
            warn!(error = %e, "Channel shutdown task failed");
        }

        if let Err(e) = recorder.drain().await {
            warn!(error = %e, "Recorder drain failed");
        }

        let path = data_log.path().to_path_buf();
        let data_log_lines = data_log.lines_written();
        if let Err(e) = data_log.close() {
            warn!(path = %path.display(), error = %e, "Data log close failed");
        }

        let stats = SessionStats {
            duration,
            composite_frames: renderer.frames_presented(),
            data_log_lines,
            data_log_failures,
            left: left.metrics(),
            right: right.metrics(),
            final_offsets: (left.offset(), right.offset()),
            recorder: recorder.metrics().snapshot(),
            display_metrics,
        };
        info!(
            composite_frames = stats.composite_frames,
            recorded = stats.recorder.written,
            duration_secs = stats.duration.as_secs_f64(),
            "Session shut down"
        );
        stats
    }
}
