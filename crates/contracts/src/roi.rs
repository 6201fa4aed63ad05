//! Region-of-interest settings and the device capability they are checked against.

use serde::{Deserialize, Serialize};

use crate::PixelFormat;

/// Requested capture window on the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiSettings {
    /// Horizontal offset of the window, in pixels
    pub offset_x: i32,
    /// Vertical offset of the window, in pixels
    pub offset_y: i32,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl RoiSettings {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;
    pub const DEFAULT_VERTICAL_OFFSET: i32 = 416;

    /// Window at `offset_x` with the rig's default size and vertical placement
    pub fn with_offset(offset_x: i32) -> Self {
        Self {
            offset_x,
            offset_y: Self::DEFAULT_VERTICAL_OFFSET,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            pixel_format: PixelFormat::Raw8,
        }
    }
}

/// What a sensor accepts for custom capture windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiCapabilities {
    pub max_width: u32,
    pub max_height: u32,
    /// Width must be a multiple of this
    pub image_h_step: u32,
    /// Height must be a multiple of this
    pub image_v_step: u32,
    /// Horizontal offset must be a multiple of this
    pub offset_h_step: u32,
    /// Vertical offset must be a multiple of this
    pub offset_v_step: u32,
    /// Formats the sensor can stream
    pub pixel_formats: Vec<PixelFormat>,
}

impl RoiCapabilities {
    /// Check `roi` against alignment and bounds.
    ///
    /// Returns the first violated rule as a human-readable message.
    pub fn check(&self, roi: &RoiSettings) -> Result<(), String> {
        fn aligned(value: i64, step: u32) -> bool {
            step == 0 || value.rem_euclid(step as i64) == 0
        }

        if roi.offset_x < 0 || roi.offset_y < 0 {
            return Err(format!(
                "offset ({}, {}) must not be negative",
                roi.offset_x, roi.offset_y
            ));
        }
        if roi.width == 0 || roi.height == 0 {
            return Err("width and height must be > 0".into());
        }
        if !aligned(roi.offset_x as i64, self.offset_h_step) {
            return Err(format!(
                "offset_x {} not aligned to {}",
                roi.offset_x, self.offset_h_step
            ));
        }
        if !aligned(roi.offset_y as i64, self.offset_v_step) {
            return Err(format!(
                "offset_y {} not aligned to {}",
                roi.offset_y, self.offset_v_step
            ));
        }
        if !aligned(roi.width as i64, self.image_h_step)
            || !aligned(roi.height as i64, self.image_v_step)
        {
            return Err(format!(
                "size {}x{} not aligned to {}x{}",
                roi.width, roi.height, self.image_h_step, self.image_v_step
            ));
        }
        if roi.offset_x as u64 + roi.width as u64 > self.max_width as u64 {
            return Err(format!(
                "offset_x {} + width {} exceeds sensor width {}",
                roi.offset_x, roi.width, self.max_width
            ));
        }
        if roi.offset_y as u64 + roi.height as u64 > self.max_height as u64 {
            return Err(format!(
                "offset_y {} + height {} exceeds sensor height {}",
                roi.offset_y, roi.height, self.max_height
            ));
        }
        if !self.pixel_formats.contains(&roi.pixel_format) {
            return Err(format!("pixel format {:?} not supported", roi.pixel_format));
        }
        Ok(())
    }
}

/// Transfer parameters negotiated for an accepted ROI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketInfo {
    pub recommended_bytes_per_packet: u32,
    pub max_bytes_per_packet: u32,
    pub unit_bytes_per_packet: u32,
}

/// Driver verdict on a requested ROI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiValidation {
    pub valid: bool,
    /// Why the settings were rejected (empty when valid)
    pub reason: String,
    pub packet: PacketInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flea3() -> RoiCapabilities {
        RoiCapabilities {
            max_width: 2080,
            max_height: 1552,
            image_h_step: 16,
            image_v_step: 2,
            offset_h_step: 4,
            offset_v_step: 2,
            pixel_formats: vec![PixelFormat::Raw8, PixelFormat::Mono8],
        }
    }

    #[test]
    fn test_default_rois_are_accepted() {
        let caps = flea3();
        assert!(caps.check(&RoiSettings::with_offset(512)).is_ok());
        assert!(caps.check(&RoiSettings::with_offset(288)).is_ok());
    }

    #[test]
    fn test_misaligned_offset_rejected() {
        let err = flea3().check(&RoiSettings::with_offset(514)).unwrap_err();
        assert!(err.contains("not aligned to 4"), "{err}");
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        assert!(flea3().check(&RoiSettings::with_offset(804)).is_err());
        assert!(flea3().check(&RoiSettings::with_offset(-4)).is_err());
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let mut roi = RoiSettings::with_offset(512);
        roi.pixel_format = PixelFormat::Rgb8;
        assert!(flea3().check(&roi).is_err());
    }
}
