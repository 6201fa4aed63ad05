//! Render surface boundary
//!
//! The compositor writes into a `DisplaySurface`; windowing backends and the
//! headless software surface implement it.

use serde::{Deserialize, Serialize};

use crate::{FrameDims, Side};

/// Rectangle on the output surface, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Borrowed packed RGB image
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub dims: FrameDims,
    pub data: &'a [u8],
}

/// Which sensor goes to which half of the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeLayout {
    /// Right sensor on the left half, left sensor on the right half
    #[default]
    RightLeft,
    /// Left sensor on the left half, right sensor on the right half
    LeftRight,
}

impl CompositeLayout {
    /// Viewport of `side` on a surface of `width` x `height`
    pub fn viewport(&self, side: Side, width: u32, height: u32) -> Viewport {
        let half = width / 2;
        let on_left_half = matches!(
            (self, side),
            (CompositeLayout::RightLeft, Side::Right) | (CompositeLayout::LeftRight, Side::Left)
        );
        if on_left_half {
            Viewport {
                x: 0,
                y: 0,
                width: half,
                height,
            }
        } else {
            Viewport {
                x: half,
                y: 0,
                width: width - half,
                height,
            }
        }
    }
}

/// Output surface the composite frame is drawn into
pub trait DisplaySurface: Send {
    /// Current surface size in pixels (width, height)
    fn size(&self) -> (u32, u32);

    /// Clear to black before drawing a new composite
    fn clear(&mut self);

    /// Draw `image` stretched to fill `viewport`
    fn upload(&mut self, viewport: Viewport, image: ImageView<'_>);

    /// Make the drawn frame visible
    fn present(&mut self);

    /// Switch between windowed and fullscreen, returns the new state
    fn toggle_fullscreen(&mut self) -> bool;

    /// Read back the presented frame as BGR rows, bottom row first
    fn read_pixels(&self) -> Vec<u8>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_puts_right_sensor_first() {
        let layout = CompositeLayout::default();
        let right = layout.viewport(Side::Right, 1280, 720);
        let left = layout.viewport(Side::Left, 1280, 720);
        assert_eq!(right.x, 0);
        assert_eq!(left.x, 640);
        assert_eq!(left.width + right.width, 1280);
    }

    #[test]
    fn test_odd_width_covers_whole_surface() {
        let layout = CompositeLayout::LeftRight;
        let left = layout.viewport(Side::Left, 1281, 10);
        let right = layout.viewport(Side::Right, 1281, 10);
        assert_eq!(left.width, 640);
        assert_eq!(right.x, 640);
        assert_eq!(right.width, 641);
    }
}
