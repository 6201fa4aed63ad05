//! Raw frames as delivered by the driver and the dimensions of converted frames.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit single channel
    Mono8,
    /// 8-bit Bayer mosaic, RGGB tile order
    #[default]
    Raw8,
    /// Packed 8-bit RGB, the interchange format
    Rgb8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel in a tightly packed row
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Mono8 | PixelFormat::Raw8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// One frame exactly as the driver produced it.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Columns in pixels
    pub width: u32,

    /// Rows in pixels
    pub height: u32,

    /// Bytes per row, `>= width * bytes_per_pixel`
    pub stride: u32,

    /// Pixel layout of `data`
    pub format: PixelFormat,

    /// Driver sequence number (diagnostics only)
    pub sequence: u64,

    /// Horizontal offset of the capture window that produced this frame
    pub offset_x: i32,

    /// Pixel payload (zero-copy)
    pub data: Bytes,
}

impl RawFrame {
    /// Payload size implied by the header fields
    pub fn expected_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

/// Geometry of the most recent converted frame in a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDims {
    pub cols: u32,
    pub rows: u32,
    pub stride: u32,
}

impl FrameDims {
    /// Tightly packed RGB geometry
    pub fn rgb(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            stride: cols * PixelFormat::Rgb8.bytes_per_pixel(),
        }
    }

    /// Bytes needed to hold the frame
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.rows as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_dims() {
        let dims = FrameDims::rgb(1280, 720);
        assert_eq!(dims.stride, 3840);
        assert_eq!(dims.byte_len(), 1280 * 720 * 3);
    }

    #[test]
    fn test_expected_len_uses_stride() {
        let frame = RawFrame {
            width: 10,
            height: 4,
            stride: 12,
            format: PixelFormat::Raw8,
            sequence: 0,
            offset_x: 0,
            data: Bytes::from(vec![0u8; 48]),
        };
        assert_eq!(frame.expected_len(), 48);
    }
}
