//! Frame-rate estimation
//!
//! The same low-pass filter smooths the per-sensor capture rate and the
//! composite display rate.

use std::time::Duration;

/// Low-pass filter over instantaneous rates
///
/// `smoothed' = 0.65 * current + 0.20 * previous + 0.15 * smoothed`
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetFilter;

impl OffsetFilter {
    pub const CURRENT_WEIGHT: f64 = 0.65;
    pub const PREVIOUS_WEIGHT: f64 = 0.20;
    pub const SMOOTHED_WEIGHT: f64 = 0.15;

    #[inline]
    pub fn apply(current: f64, previous: f64, smoothed: f64) -> f64 {
        Self::CURRENT_WEIGHT * current
            + Self::PREVIOUS_WEIGHT * previous
            + Self::SMOOTHED_WEIGHT * smoothed
    }
}

/// Instantaneous and smoothed rate of one frame stream, in frames per second
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateEstimate {
    pub instant: f64,
    pub previous_instant: f64,
    pub smoothed: f64,
}

impl RateEstimate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one arrival.
    ///
    /// `since_previous` is `None` for the first arrival of a stream. The filter
    /// only runs once a previous arrival exists and the previous instantaneous
    /// rate is non-zero, so the first frame leaves everything at zero and the
    /// second frame only seeds `instant`.
    pub fn update(&mut self, since_previous: Option<Duration>) -> f64 {
        self.previous_instant = self.instant;
        self.instant = match since_previous {
            Some(elapsed) if !elapsed.is_zero() => 1.0 / elapsed.as_secs_f64(),
            _ => 0.0,
        };
        if since_previous.is_some() && self.previous_instant != 0.0 {
            self.smoothed = OffsetFilter::apply(self.instant, self.previous_instant, self.smoothed);
        }
        self.smoothed
    }
}
