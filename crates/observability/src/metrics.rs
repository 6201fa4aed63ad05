//! Session metrics
//!
//! Prometheus-facing helpers plus an in-memory aggregator used for the
//! summary printed when a session ends.

use contracts::Side;
use metrics::{counter, gauge, histogram};

/// Record one presented composite frame
///
/// `skew_ms` is the capture-time difference LEFT minus RIGHT.
pub fn record_composite_frame(display_fps: f64, skew_ms: f64) {
    counter!("stereocam_composite_frames_total").increment(1);
    gauge!("stereocam_display_fps").set(display_fps);
    histogram!("stereocam_stereo_skew_ms").record(skew_ms.abs());
}

/// Current health of one capture channel
pub fn record_channel_health(side: Side, fps: f64, published: u64, dropped: u64) {
    let side = side.as_str();
    gauge!("stereocam_sensor_fps", "side" => side).set(fps);
    gauge!("stereocam_sensor_frames_published", "side" => side).set(published as f64);
    gauge!("stereocam_sensor_frames_dropped", "side" => side).set(dropped as f64);
}

/// Horizontal window offsets after an adjustment
pub fn record_offsets(left: i32, right: i32) {
    gauge!("stereocam_roi_offset", "side" => Side::Left.as_str()).set(left as f64);
    gauge!("stereocam_roi_offset", "side" => Side::Right.as_str()).set(right as f64);
}

/// One composite frame handed to the recorder
pub fn record_frame_recorded(wait_ms: f64) {
    counter!("stereocam_frames_recorded_total").increment(1);
    histogram!("stereocam_recorder_wait_ms").record(wait_ms);
}

/// Aggregates composite-frame statistics in memory
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    pub total_frames: u64,
    pub recorded_frames: u64,
    /// Display rate after each frame
    pub display_fps: RunningStats,
    /// |LEFT - RIGHT| capture time
    pub skew_ms: RunningStats,
    /// Time spent waiting for the previous write
    pub recorder_wait_ms: RunningStats,
}

impl SessionMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, display_fps: f64, skew_ms: f64) {
        self.total_frames += 1;
        // the first frame has no rate yet
        if display_fps > 0.0 {
            self.display_fps.push(display_fps);
        }
        self.skew_ms.push(skew_ms.abs());
    }

    pub fn record_submission(&mut self, wait_ms: f64) {
        self.recorded_frames += 1;
        self.recorder_wait_ms.push(wait_ms);
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            recorded_frames: self.recorded_frames,
            display_fps: StatsSummary::from(&self.display_fps),
            skew_ms: StatsSummary::from(&self.skew_ms),
            recorder_wait_ms: StatsSummary::from(&self.recorder_wait_ms),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub recorded_frames: u64,
    pub display_fps: StatsSummary,
    pub skew_ms: StatsSummary,
    pub recorder_wait_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Display Metrics Summary ===")?;
        writeln!(f, "Composite frames: {}", self.total_frames)?;
        writeln!(f, "Recorded frames: {}", self.recorded_frames)?;
        writeln!(f, "Display rate (fps): {}", self.display_fps)?;
        writeln!(f, "Stereo skew (ms): {}", self.skew_ms)?;
        writeln!(f, "Recorder wait (ms): {}", self.recorder_wait_ms)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
