//! SessionBlueprint - Config Loader output
//!
//! Describes one run of the rig: which serial is which side, the capture
//! window, the display, where output goes and how the simulated driver behaves.
//! Every section has defaults, so an empty file is a valid blueprint.

use serde::{Deserialize, Serialize};

use crate::{CompositeLayout, PixelFormat, RoiCapabilities, RoiSettings, Side};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    pub rig: RigConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Serial numbers that decide which physical sensor is which side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default = "default_left_serial")]
    pub left_serial: u32,

    #[serde(default = "default_right_serial")]
    pub right_serial: u32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            left_serial: default_left_serial(),
            right_serial: default_right_serial(),
        }
    }
}

fn default_left_serial() -> u32 {
    14150447
}

fn default_right_serial() -> u32 {
    14150448
}

/// Capture window and stereo spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_width")]
    pub width: u32,

    #[serde(default = "default_capture_height")]
    pub height: u32,

    #[serde(default = "default_vertical_offset")]
    pub vertical_offset: i32,

    /// Horizontal ROI offset of the left sensor
    #[serde(default = "default_left_offset")]
    pub left_offset: i32,

    /// Horizontal ROI offset of the right sensor
    #[serde(default = "default_right_offset")]
    pub right_offset: i32,

    /// Alignment every horizontal offset must respect
    #[serde(default = "default_offset_step")]
    pub offset_step: u32,

    /// Offset change per Up/Down command
    #[serde(default = "default_offset_step")]
    pub adjust_magnitude: u32,

    #[serde(default)]
    pub pixel_format: PixelFormat,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_capture_width(),
            height: default_capture_height(),
            vertical_offset: default_vertical_offset(),
            left_offset: default_left_offset(),
            right_offset: default_right_offset(),
            offset_step: default_offset_step(),
            adjust_magnitude: default_offset_step(),
            pixel_format: PixelFormat::default(),
        }
    }
}

impl CaptureConfig {
    /// Starting horizontal offset of `side`
    pub fn offset_for(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.left_offset,
            Side::Right => self.right_offset,
        }
    }

    /// Capture window at `offset_x`
    pub fn roi_at(&self, offset_x: i32) -> RoiSettings {
        RoiSettings {
            offset_x,
            offset_y: self.vertical_offset,
            width: self.width,
            height: self.height,
            pixel_format: self.pixel_format,
        }
    }

    /// Starting capture window of `side`
    pub fn roi_for(&self, side: Side) -> RoiSettings {
        self.roi_at(self.offset_for(side))
    }
}

fn default_capture_width() -> u32 {
    RoiSettings::DEFAULT_WIDTH
}

fn default_capture_height() -> u32 {
    RoiSettings::DEFAULT_HEIGHT
}

fn default_vertical_offset() -> i32 {
    RoiSettings::DEFAULT_VERTICAL_OFFSET
}

fn default_left_offset() -> i32 {
    512
}

fn default_right_offset() -> i32 {
    288
}

fn default_offset_step() -> u32 {
    4
}

/// Composite output surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_width")]
    pub width: u32,

    #[serde(default = "default_display_height")]
    pub height: u32,

    #[serde(default)]
    pub layout: CompositeLayout,

    /// Render tick period
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub start_fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_display_width(),
            height: default_display_height(),
            layout: CompositeLayout::default(),
            tick_interval_ms: default_tick_interval_ms(),
            start_fullscreen: false,
        }
    }
}

fn default_display_width() -> u32 {
    1280
}

fn default_display_height() -> u32 {
    720
}

fn default_tick_interval_ms() -> u64 {
    5
}

/// Session output location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Parent of every session directory
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// chrono format of the session directory and file base name
    #[serde(default = "default_session_name_format")]
    pub session_name_format: String,

    #[serde(default)]
    pub record_on_start: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            session_name_format: default_session_name_format(),
            record_on_start: false,
        }
    }
}

fn default_base_dir() -> String {
    "image_data".to_string()
}

fn default_session_name_format() -> String {
    "%m%d-%H%M%S".to_string()
}

/// Behaviour of the simulated driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Frames per second produced by every simulated sensor
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: f64,

    /// Attached devices, in bus order
    #[serde(default = "default_simulated_devices")]
    pub devices: Vec<SimulatedDevice>,

    #[serde(default = "default_sensor_capabilities")]
    pub capabilities: RoiCapabilities,

    #[serde(default)]
    pub failures: FailureInjection,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: default_frame_rate_hz(),
            devices: default_simulated_devices(),
            capabilities: default_sensor_capabilities(),
            failures: FailureInjection::default(),
        }
    }
}

/// One simulated sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedDevice {
    pub serial: u32,

    #[serde(default = "default_model")]
    pub model: String,
}

/// Faults the simulated driver injects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInjection {
    /// Serials whose connection attempt fails
    #[serde(default)]
    pub unreachable_serials: Vec<u32>,

    /// Every n-th frame is delivered truncated so conversion fails (0 = never)
    #[serde(default)]
    pub corrupt_every_nth_frame: u64,
}

fn default_frame_rate_hz() -> f64 {
    30.0
}

fn default_model() -> String {
    "Flea3 FL3-U3-32S2C".to_string()
}

fn default_simulated_devices() -> Vec<SimulatedDevice> {
    // right sensor enumerates first so the serial matching swaps indices
    vec![
        SimulatedDevice {
            serial: default_right_serial(),
            model: default_model(),
        },
        SimulatedDevice {
            serial: default_left_serial(),
            model: default_model(),
        },
    ]
}

fn default_sensor_capabilities() -> RoiCapabilities {
    RoiCapabilities {
        max_width: 2080,
        max_height: 1552,
        image_h_step: 16,
        image_v_step: 2,
        offset_h_step: 4,
        offset_v_step: 2,
        pixel_formats: vec![PixelFormat::Raw8, PixelFormat::Mono8, PixelFormat::Rgb8],
    }
}

impl SessionBlueprint {
    /// Configured serial of `side`
    pub fn serial_for(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.rig.left_serial,
            Side::Right => self.rig.right_serial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_rig_defaults() {
        let bp: SessionBlueprint = toml::from_str("").unwrap();
        assert_eq!(bp.rig.left_serial, 14150447);
        assert_eq!(bp.rig.right_serial, 14150448);
        assert_eq!(bp.capture.left_offset, 512);
        assert_eq!(bp.capture.right_offset, 288);
        assert_eq!(bp.capture.vertical_offset, 416);
        assert_eq!(bp.capture.adjust_magnitude, 4);
        assert_eq!(bp.display.layout, CompositeLayout::RightLeft);
        assert_eq!(bp.output.session_name_format, "%m%d-%H%M%S");
        assert_eq!(bp, SessionBlueprint::default());
    }

    #[test]
    fn test_roi_for_uses_side_offset() {
        let capture = CaptureConfig::default();
        let left = capture.roi_for(Side::Left);
        let right = capture.roi_for(Side::Right);
        assert_eq!(left.offset_x, 512);
        assert_eq!(right.offset_x, 288);
        assert_eq!(left.offset_y, 416);
        assert_eq!((left.width, left.height), (1280, 720));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let bp: SessionBlueprint = serde_json::from_str(
            r#"{ "capture": { "left_offset": 600 }, "display": { "layout": "left_right" } }"#,
        )
        .unwrap();
        assert_eq!(bp.capture.left_offset, 600);
        assert_eq!(bp.capture.right_offset, 288);
        assert_eq!(bp.display.layout, CompositeLayout::LeftRight);
        assert_eq!(bp.simulator.devices.len(), 2);
    }

    #[test]
    fn test_serial_for() {
        let bp = SessionBlueprint::default();
        assert_eq!(bp.serial_for(Side::Left), 14150447);
        assert_eq!(bp.serial_for(Side::Right), 14150448);
    }
}
