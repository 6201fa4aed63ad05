//! Single-slot frame buffer
//!
//! Holds at most one unconsumed frame. Publishing overwrites whatever is there;
//! pixels, geometry, counter, rate and timestamps change together under the
//! owning channel's lock.

use std::time::{Duration, Instant};

use contracts::{FrameDims, Side};

use crate::rate::RateEstimate;

/// Result of publishing one frame, for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishedFrame {
    pub frame_number: u64,
    /// Time since the first frame of this slot
    pub elapsed: Duration,
    pub fps: f64,
    /// An unconsumed frame was replaced
    pub overwrote: bool,
}

/// What the consumer learns about the frame it copied out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub side: Side,
    pub frame_number: u64,
    pub dims: FrameDims,
    /// Window offset the frame was captured with
    pub offset_x: i32,
    /// Milliseconds between this channel's first frame and this one
    pub elapsed_ms: u64,
    pub fps: f64,
    pub captured_at: Instant,
}

#[derive(Debug)]
pub struct FrameSlot {
    side: Side,
    buffer: Vec<u8>,
    dims: FrameDims,
    offset_x: i32,
    /// Number given to the next published frame
    next_frame_number: u64,
    latest_frame_number: u64,
    rate: RateEstimate,
    new_frame: bool,
    first_arrival: Option<Instant>,
    latest_arrival: Option<Instant>,
    /// Cleared while capture is stopped or being reconfigured
    accepting: bool,
}

impl FrameSlot {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            buffer: Vec::new(),
            dims: FrameDims::default(),
            offset_x: 0,
            next_frame_number: 0,
            latest_frame_number: 0,
            rate: RateEstimate::new(),
            new_frame: false,
            first_arrival: None,
            latest_arrival: None,
            accepting: false,
        }
    }

    /// Size the buffer for frames of `dims`. Only the first call allocates.
    ///
    /// Returns false when a buffer of a different size already exists.
    pub fn allocate(&mut self, dims: FrameDims) -> bool {
        if self.buffer.is_empty() {
            self.buffer = vec![0; dims.byte_len()];
            self.dims = dims;
            true
        } else {
            self.buffer.len() == dims.byte_len()
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn has_new_frame(&self) -> bool {
        self.new_frame
    }

    /// Frames published so far
    pub fn frames_published(&self) -> u64 {
        self.next_frame_number
    }

    /// Copy `pixels` into the slot and mark it ready.
    ///
    /// Returns `None` without touching the slot when `pixels` does not match
    /// the allocated size.
    pub fn publish(
        &mut self,
        pixels: &[u8],
        dims: FrameDims,
        offset_x: i32,
        now: Instant,
    ) -> Option<PublishedFrame> {
        if pixels.len() != self.buffer.len() {
            return None;
        }
        self.buffer.copy_from_slice(pixels);
        self.dims = dims;
        self.offset_x = offset_x;

        let since_previous = self.latest_arrival.map(|prev| now.saturating_duration_since(prev));
        let fps = self.rate.update(since_previous);
        let first = *self.first_arrival.get_or_insert(now);
        self.latest_arrival = Some(now);

        let overwrote = self.new_frame;
        self.new_frame = true;
        self.latest_frame_number = self.next_frame_number;
        self.next_frame_number += 1;

        Some(PublishedFrame {
            frame_number: self.latest_frame_number,
            elapsed: now.saturating_duration_since(first),
            fps,
            overwrote,
        })
    }

    /// Copy the pending frame into `out` and clear the flag.
    ///
    /// Returns `None` if nothing new was published since the last call.
    pub fn consume_into(&mut self, out: &mut Vec<u8>) -> Option<FrameSnapshot> {
        if !self.new_frame {
            return None;
        }
        self.new_frame = false;
        out.clear();
        out.extend_from_slice(&self.buffer);

        let captured_at = self.latest_arrival?;
        let elapsed = self
            .first_arrival
            .map(|first| captured_at.saturating_duration_since(first))
            .unwrap_or_default();
        Some(FrameSnapshot {
            side: self.side,
            frame_number: self.latest_frame_number,
            dims: self.dims,
            offset_x: self.offset_x,
            elapsed_ms: elapsed.as_millis() as u64,
            fps: self.rate.smoothed,
            captured_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(len_cols: u32) -> FrameSlot {
        let mut slot = FrameSlot::new(Side::Left);
        assert!(slot.allocate(FrameDims::rgb(len_cols, 1)));
        slot.set_accepting(true);
        slot
    }

    #[test]
    fn test_allocates_once() {
        let mut slot = slot(4);
        assert_eq!(slot.capacity(), 12);
        assert!(slot.allocate(FrameDims::rgb(4, 1)));
        assert!(!slot.allocate(FrameDims::rgb(8, 1)));
        assert_eq!(slot.capacity(), 12);
    }

    #[test]
    fn test_second_publish_overwrites_first() {
        let mut slot = slot(2);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(30);
        let first = slot.publish(&[1; 6], FrameDims::rgb(2, 1), 0, t0).unwrap();
        let second = slot.publish(&[2; 6], FrameDims::rgb(2, 1), 8, t1).unwrap();
        assert!(!first.overwrote);
        assert!(second.overwrote);

        let mut out = Vec::new();
        let snap = slot.consume_into(&mut out).unwrap();
        assert_eq!(out, vec![2; 6]);
        assert_eq!(snap.frame_number, 1);
        assert_eq!(snap.captured_at, t1);
        assert_eq!(snap.offset_x, 8);
        assert_eq!(snap.elapsed_ms, 30);
        assert!(slot.consume_into(&mut out).is_none());
    }

    #[test]
    fn test_wrong_size_frame_is_rejected() {
        let mut slot = slot(2);
        assert!(slot.publish(&[0; 5], FrameDims::rgb(2, 1), 0, Instant::now()).is_none());
        assert!(!slot.has_new_frame());
        assert_eq!(slot.frames_published(), 0);
    }

    #[test]
    fn test_counter_and_elapsed_follow_first_frame() {
        let mut slot = slot(1);
        let t0 = Instant::now();
        for i in 0..5u64 {
            let published = slot
                .publish(&[i as u8; 3], FrameDims::rgb(1, 1), 0, t0 + Duration::from_millis(10 * i))
                .unwrap();
            assert_eq!(published.frame_number, i);
            assert_eq!(published.elapsed, Duration::from_millis(10 * i));
        }
        assert_eq!(slot.frames_published(), 5);
    }
}
