//! Session statistics

use std::time::Duration;

use capture::ChannelMetricsSnapshot;
use observability::SessionMetricsAggregator;
use recorder::RecorderMetricsSnapshot;

/// Statistics from one session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall time from start to shutdown
    pub duration: Duration,

    /// Composite frames presented
    pub composite_frames: u64,

    /// Lines appended to the data log
    pub data_log_lines: u64,

    /// Data log appends that failed
    pub data_log_failures: u64,

    pub left: ChannelMetricsSnapshot,
    pub right: ChannelMetricsSnapshot,

    /// Horizontal window offsets at shutdown
    pub final_offsets: (i32, i32),

    pub recorder: RecorderMetricsSnapshot,

    pub display_metrics: SessionMetricsAggregator,
}

impl SessionStats {
    /// Mean composite frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.composite_frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Sensor frames never shown, as a percentage of the ones published
    pub fn unshown_rate(&self) -> f64 {
        let published = self.left.frames_published + self.right.frames_published;
        if published > 0 {
            let shown = self.composite_frames * 2;
            published.saturating_sub(shown) as f64 / published as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Session Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Composite frames: {}", self.composite_frames);
        println!("   ├─ Mean display FPS: {:.2}", self.fps());
        println!(
            "   ├─ Final offsets: left {} / right {}",
            self.final_offsets.0, self.final_offsets.1
        );
        println!(
            "   └─ Data log lines: {} ({} failed)",
            self.data_log_lines, self.data_log_failures
        );

        for (name, channel) in [("Left", &self.left), ("Right", &self.right)] {
            println!("\n{name} channel");
            println!("   ├─ Frames received: {}", channel.frames_received);
            println!("   ├─ Frames published: {}", channel.frames_published);
            println!("   ├─ Overwritten before display: {}", channel.frames_overwritten);
            println!("   ├─ Conversion failures: {}", channel.conversion_failures);
            println!("   └─ Discarded while reconfiguring: {}", channel.frames_discarded);
        }

        println!("\nRecording");
        println!("   ├─ Frames submitted: {}", self.recorder.submitted);
        println!("   ├─ Frames written: {}", self.recorder.written);
        println!("   ├─ Write failures: {}", self.recorder.failures);
        println!("   ├─ Bytes written: {}", self.recorder.bytes);
        println!(
            "   └─ Waits on previous write: {} (max {} us)",
            self.recorder.waits, self.recorder.max_wait_us
        );

        let summary = self.display_metrics.summary();
        println!("\nDisplay");
        println!("   ├─ Display rate (fps): {}", summary.display_fps);
        println!("   ├─ Stereo skew (ms): {}", summary.skew_ms);
        println!("   └─ Recorder wait (ms): {}", summary.recorder_wait_ms);

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps() {
        let stats = SessionStats {
            duration: Duration::from_secs(2),
            composite_frames: 60,
            ..Default::default()
        };
        assert!((stats.fps() - 30.0).abs() < 1e-9);
        assert_eq!(SessionStats::default().fps(), 0.0);
    }

    #[test]
    fn test_unshown_rate() {
        let stats = SessionStats {
            composite_frames: 40,
            left: ChannelMetricsSnapshot {
                frames_published: 50,
                ..Default::default()
            },
            right: ChannelMetricsSnapshot {
                frames_published: 50,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!((stats.unshown_rate() - 20.0).abs() < 1e-9);
    }
}
