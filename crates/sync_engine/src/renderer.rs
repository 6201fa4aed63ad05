//! CompositeRenderer - the single consumer of both channels

use std::time::Instant;

use capture::{FrameSnapshot, RateEstimate};
use contracts::{CompositeLayout, DataRecord, DisplaySurface, ImageView, Side};
use tracing::debug;

use crate::gate::SynchronizationGate;

/// One presented composite frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeFrame {
    pub frame_number: u64,
    /// Smoothed display rate after this frame
    pub display_fps: f64,
    pub record: DataRecord,
    pub left: FrameSnapshot,
    pub right: FrameSnapshot,
    pub presented_at: Instant,
}

impl CompositeFrame {
    /// Capture-time difference between the two halves, LEFT minus RIGHT
    pub fn skew_ms(&self) -> f64 {
        if self.left.captured_at >= self.right.captured_at {
            (self.left.captured_at - self.right.captured_at).as_secs_f64() * 1000.0
        } else {
            -((self.right.captured_at - self.left.captured_at).as_secs_f64() * 1000.0)
        }
    }
}

pub struct CompositeRenderer {
    gate: SynchronizationGate,
    surface: Box<dyn DisplaySurface>,
    layout: CompositeLayout,
    left_scratch: Vec<u8>,
    right_scratch: Vec<u8>,
    frame_number: u64,
    rate: RateEstimate,
    last_present: Option<Instant>,
    session_start: Instant,
}

impl CompositeRenderer {
    pub fn new(
        gate: SynchronizationGate,
        surface: Box<dyn DisplaySurface>,
        layout: CompositeLayout,
    ) -> Self {
        Self::with_session_start(gate, surface, layout, Instant::now())
    }

    /// Renderer whose display timestamps count from `session_start`
    pub fn with_session_start(
        gate: SynchronizationGate,
        surface: Box<dyn DisplaySurface>,
        layout: CompositeLayout,
        session_start: Instant,
    ) -> Self {
        Self {
            gate,
            surface,
            layout,
            left_scratch: Vec::new(),
            right_scratch: Vec::new(),
            frame_number: 0,
            rate: RateEstimate::new(),
            last_present: None,
            session_start,
        }
    }

    pub fn gate(&self) -> &SynchronizationGate {
        &self.gate
    }

    /// Composite frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frame_number
    }

    pub fn display_rate(&self) -> RateEstimate {
        self.rate
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface.size()
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.surface.toggle_fullscreen()
    }

    /// Presented composite as BGR rows, bottom row first
    pub fn read_pixels(&self) -> Vec<u8> {
        self.surface.read_pixels()
    }

    /// One render tick.
    ///
    /// A no-op unless both channels have a new frame. Otherwise both frames
    /// are drawn side by side, presented, and the frame's data-log record is
    /// returned.
    pub fn tick(&mut self) -> Option<CompositeFrame> {
        let pair = self
            .gate
            .try_consume(&mut self.left_scratch, &mut self.right_scratch)?;

        let (width, height) = self.surface.size();
        self.surface.clear();
        for (side, snapshot, data) in [
            (Side::Left, &pair.left, &self.left_scratch),
            (Side::Right, &pair.right, &self.right_scratch),
        ] {
            let viewport = self.layout.viewport(side, width, height);
            self.surface.upload(
                viewport,
                ImageView {
                    dims: snapshot.dims,
                    data,
                },
            );
        }
        self.surface.present();

        let now = Instant::now();
        let display_fps = self
            .rate
            .update(self.last_present.map(|prev| now.saturating_duration_since(prev)));
        self.last_present = Some(now);

        let frame_number = self.frame_number;
        self.frame_number += 1;
        debug!(
            frame = frame_number,
            fps = display_fps,
            "Displaying frame ({frame_number}): display rate {display_fps:.3}"
        );

        Some(CompositeFrame {
            frame_number,
            display_fps,
            record: DataRecord {
                frame_number,
                display_elapsed_ms: now.saturating_duration_since(self.session_start).as_millis() as u64,
                left_elapsed_ms: pair.left.elapsed_ms,
                right_elapsed_ms: pair.right.elapsed_ms,
            },
            left: pair.left,
            right: pair.right,
            presented_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SoftwareSurface;
    use bytes::Bytes;
    use capture::SensorChannel;
    use contracts::{PixelFormat, RawFrame, RoiSettings, SimulatorConfig};
    use sensor_driver::MockDriver;
    use std::sync::Arc;

    fn channel(side: Side, driver: &MockDriver, serial: u32) -> Arc<SensorChannel> {
        let roi = RoiSettings {
            offset_x: 0,
            offset_y: 0,
            width: 16,
            height: 2,
            pixel_format: PixelFormat::Rgb8,
        };
        let channel = SensorChannel::new(side, roi, 4);
        channel
            .connect(driver, &MockDriver::device_id_for(serial))
            .unwrap();
        channel.lock_slot().set_accepting(true);
        channel
    }

    fn solid(rgb: [u8; 3]) -> RawFrame {
        RawFrame {
            width: 16,
            height: 2,
            stride: 48,
            format: PixelFormat::Rgb8,
            sequence: 0,
            offset_x: 0,
            data: Bytes::from(rgb.repeat(32)),
        }
    }

    fn renderer(layout: CompositeLayout) -> CompositeRenderer {
        let driver = MockDriver::new(SimulatorConfig::default());
        let gate = SynchronizationGate::new(
            channel(Side::Left, &driver, 14150447),
            channel(Side::Right, &driver, 14150448),
        );
        CompositeRenderer::new(gate, Box::new(SoftwareSurface::new(8, 2)), layout)
    }

    /// First BGR pixel of the bottom row's left and right halves
    fn halves(renderer: &CompositeRenderer) -> ([u8; 3], [u8; 3]) {
        let px = renderer.read_pixels();
        let left = [px[2], px[1], px[0]];
        let right = [px[14], px[13], px[12]];
        (left, right)
    }

    #[test]
    fn test_tick_without_pair_is_noop() {
        let mut renderer = renderer(CompositeLayout::default());
        assert!(renderer.tick().is_none());
        renderer.gate().left().on_frame(solid([1, 1, 1]));
        assert!(renderer.tick().is_none());
        assert_eq!(renderer.frames_presented(), 0);
    }

    #[test]
    fn test_default_layout_puts_right_sensor_on_left_half() {
        let mut renderer = renderer(CompositeLayout::RightLeft);
        renderer.gate().left().on_frame(solid([200, 0, 0]));
        renderer.gate().right().on_frame(solid([0, 0, 200]));
        let frame = renderer.tick().unwrap();
        assert_eq!(frame.frame_number, 0);
        assert_eq!(halves(&renderer), ([0, 0, 200], [200, 0, 0]));
    }

    #[test]
    fn test_left_right_layout() {
        let mut renderer = renderer(CompositeLayout::LeftRight);
        renderer.gate().left().on_frame(solid([200, 0, 0]));
        renderer.gate().right().on_frame(solid([0, 0, 200]));
        renderer.tick().unwrap();
        assert_eq!(halves(&renderer), ([200, 0, 0], [0, 0, 200]));
    }

    #[test]
    fn test_records_number_consecutively() {
        let mut renderer = renderer(CompositeLayout::default());
        for n in 0..3u64 {
            renderer.gate().left().on_frame(solid([1, 2, 3]));
            renderer.gate().right().on_frame(solid([4, 5, 6]));
            let frame = renderer.tick().unwrap();
            assert_eq!(frame.frame_number, n);
            assert_eq!(frame.record.frame_number, n);
            assert_eq!(frame.left.frame_number, n);
            assert!(frame.record.display_elapsed_ms >= frame.record.left_elapsed_ms);
        }
        assert_eq!(renderer.frames_presented(), 3);
        assert!(renderer.display_rate().instant > 0.0);
    }
}
