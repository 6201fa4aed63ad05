//! Mock camera implementation
//!
//! Implements `CameraDevice`, streaming synthetic frames from a background
//! thread at a fixed rate. Frames are pushed to the registered `FrameSink`,
//! the same way the vendor driver invokes its completion callback.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    CameraDevice, ContractError, DeviceId, DeviceInfo, FrameSink, PacketInfo, PixelConverter,
    PixelFormat, RawFrame, RoiCapabilities, RoiSettings, RoiValidation,
};
use tracing::{debug, instrument, trace};

use crate::converter::RgbConverter;
use crate::error::SensorDriverError;

const MAX_BYTES_PER_PACKET: u32 = 9000;
const UNIT_BYTES_PER_PACKET: u32 = 4;

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    /// Send frequency (Hz)
    pub frequency_hz: f64,
    pub capabilities: RoiCapabilities,
    /// Every n-th frame is truncated so conversion fails (0 = never)
    pub corrupt_every_nth_frame: u64,
}

impl Default for MockCameraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 30.0,
            capabilities: RoiCapabilities {
                max_width: 2080,
                max_height: 1552,
                image_h_step: 16,
                image_v_step: 2,
                offset_h_step: 4,
                offset_v_step: 2,
                pixel_formats: vec![PixelFormat::Raw8, PixelFormat::Mono8, PixelFormat::Rgb8],
            },
            corrupt_every_nth_frame: 0,
        }
    }
}

/// Frame thread of a streaming camera
struct Stream {
    listening: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Mock camera
///
/// One live connection to a simulated sensor. Dropping the camera stops the
/// stream and releases the connection.
pub struct MockCamera {
    id: DeviceId,
    info: DeviceInfo,
    config: MockCameraConfig,
    roi: RoiSettings,
    bytes_per_packet: u32,
    sequence: Arc<AtomicU64>,
    stream: Option<Stream>,
    connected: bool,
    /// Registry of open connections shared with the driver
    registry: Arc<Mutex<HashSet<DeviceId>>>,
    converter: Arc<RgbConverter>,
}

impl MockCamera {
    /// Create a connected camera with the full sensor as capture window
    pub fn new(
        id: DeviceId,
        info: DeviceInfo,
        config: MockCameraConfig,
        registry: Arc<Mutex<HashSet<DeviceId>>>,
    ) -> Self {
        let roi = RoiSettings {
            offset_x: 0,
            offset_y: 0,
            width: config.capabilities.max_width,
            height: config.capabilities.max_height,
            pixel_format: PixelFormat::Raw8,
        };
        Self {
            id,
            info,
            config,
            roi,
            bytes_per_packet: MAX_BYTES_PER_PACKET,
            sequence: Arc::new(AtomicU64::new(0)),
            stream: None,
            connected: true,
            registry,
            converter: Arc::new(RgbConverter::new()),
        }
    }

    /// Capture window currently applied
    pub fn roi(&self) -> RoiSettings {
        self.roi
    }

    /// Packet size the stream was configured with
    pub fn bytes_per_packet(&self) -> u32 {
        self.bytes_per_packet
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    fn ensure_connected(&self) -> Result<(), SensorDriverError> {
        if self.connected {
            Ok(())
        } else {
            Err(SensorDriverError::not_connected(self.id.as_str()))
        }
    }

    fn ensure_idle(&self) -> Result<(), SensorDriverError> {
        self.ensure_connected()?;
        if self.stream.is_some() {
            return Err(SensorDriverError::busy(self.id.as_str()));
        }
        Ok(())
    }

    fn packet_info(roi: &RoiSettings) -> PacketInfo {
        let row_bytes = roi.width * roi.pixel_format.bytes_per_pixel();
        let recommended = row_bytes.clamp(UNIT_BYTES_PER_PACKET, MAX_BYTES_PER_PACKET);
        PacketInfo {
            recommended_bytes_per_packet: recommended - recommended % UNIT_BYTES_PER_PACKET,
            max_bytes_per_packet: MAX_BYTES_PER_PACKET,
            unit_bytes_per_packet: UNIT_BYTES_PER_PACKET,
        }
    }

    /// Generate one synthetic frame
    ///
    /// Pixel values encode the sensor column, the row and the sequence number,
    /// so a shifted ROI produces visibly shifted content.
    fn generate_frame(roi: &RoiSettings, sequence: u64, corrupt_every: u64) -> RawFrame {
        let bpp = roi.pixel_format.bytes_per_pixel();
        let stride = roi.width * bpp;
        let mut data = Vec::with_capacity(stride as usize * roi.height as usize);
        for y in 0..roi.height {
            let row_base = (y as u64 + roi.offset_y as u64 + sequence) as u8;
            for x in 0..roi.width {
                let v = row_base.wrapping_add((x as i64 + roi.offset_x as i64) as u8);
                for _ in 0..bpp {
                    data.push(v);
                }
            }
        }
        if corrupt_every > 0 && sequence % corrupt_every == 0 {
            data.truncate(data.len() / 2);
        }
        RawFrame {
            width: roi.width,
            height: roi.height,
            stride,
            format: roi.pixel_format,
            sequence,
            offset_x: roi.offset_x,
            data: Bytes::from(data),
        }
    }

    fn stop_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.listening.store(false, Ordering::SeqCst);
            // the last owner may drop the camera from inside its own sink
            if stream.thread.thread().id() == thread::current().id() {
                return;
            }
            if stream.thread.join().is_err() {
                debug!(device = %self.id, "frame thread panicked");
            }
            debug!(device = %self.id, "mock camera stopped");
        }
    }
}

impl CameraDevice for MockCamera {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn info(&self) -> Result<DeviceInfo, ContractError> {
        self.ensure_connected()?;
        Ok(self.info.clone())
    }

    fn roi_capabilities(&self) -> Result<RoiCapabilities, ContractError> {
        self.ensure_connected()?;
        Ok(self.config.capabilities.clone())
    }

    fn validate_roi(&self, roi: &RoiSettings) -> Result<RoiValidation, ContractError> {
        self.ensure_connected()?;
        Ok(match self.config.capabilities.check(roi) {
            Ok(()) => RoiValidation {
                valid: true,
                reason: String::new(),
                packet: Self::packet_info(roi),
            },
            Err(reason) => RoiValidation {
                valid: false,
                reason,
                packet: PacketInfo::default(),
            },
        })
    }

    #[instrument(name = "mock_camera_apply_roi", skip(self, roi), fields(device = %self.id, offset_x = roi.offset_x))]
    fn apply_roi(&mut self, roi: &RoiSettings, bytes_per_packet: u32) -> Result<(), ContractError> {
        self.ensure_idle()?;
        if let Err(reason) = self.config.capabilities.check(roi) {
            return Err(SensorDriverError::RoiRejected {
                device: self.id.to_string(),
                reason,
            }
            .into());
        }
        self.roi = *roi;
        self.bytes_per_packet = bytes_per_packet;
        Ok(())
    }

    #[instrument(name = "mock_camera_start", skip(self, sink), fields(device = %self.id))]
    fn start_capture(&mut self, sink: Arc<dyn FrameSink>) -> Result<(), ContractError> {
        self.ensure_idle()?;

        let listening = Arc::new(AtomicBool::new(true));
        let flag = listening.clone();
        let roi = self.roi;
        let sequence = self.sequence.clone();
        let corrupt_every = self.config.corrupt_every_nth_frame;
        let interval = Duration::from_secs_f64(1.0 / self.config.frequency_hz);
        let device = self.id.clone();

        let thread = thread::Builder::new()
            .name(format!("cam-{}", self.id))
            .spawn(move || {
                let mut next = Instant::now();
                debug!(device = %device, interval_ms = interval.as_millis() as u64, "mock camera started");
                while flag.load(Ordering::Acquire) {
                    let seq = sequence.fetch_add(1, Ordering::Relaxed) + 1;
                    let frame = Self::generate_frame(&roi, seq, corrupt_every);
                    sink.deliver(frame);
                    trace!(device = %device, seq, "mock frame delivered");

                    next += interval;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else {
                        next = now;
                    }
                }
            })
            .map_err(|source| SensorDriverError::Spawn {
                device: self.id.to_string(),
                source,
            })?;

        self.stream = Some(Stream { listening, thread });
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), ContractError> {
        self.stop_stream();
        Ok(())
    }

    fn grab_one(&mut self) -> Result<RawFrame, ContractError> {
        self.ensure_idle()?;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Self::generate_frame(&self.roi, seq, 0))
    }

    fn converter(&self) -> Arc<dyn PixelConverter> {
        self.converter.clone()
    }

    #[instrument(name = "mock_camera_disconnect", skip(self), fields(device = %self.id))]
    fn disconnect(&mut self) -> Result<(), ContractError> {
        self.stop_stream();
        if self.connected {
            self.connected = false;
            self.registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
        Ok(())
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSink {
        frames: AtomicUsize,
        last_offset_pixel: Mutex<Option<u8>>,
    }

    impl FrameSink for CountingSink {
        fn deliver(&self, frame: RawFrame) {
            self.frames.fetch_add(1, Ordering::SeqCst);
            *self.last_offset_pixel.lock().unwrap() = frame.data.first().copied();
        }
    }

    fn camera(frequency_hz: f64) -> MockCamera {
        let id = DeviceId::new("sim-1");
        let registry = Arc::new(Mutex::new(HashSet::from([id.clone()])));
        MockCamera::new(
            id,
            DeviceInfo::default(),
            MockCameraConfig {
                frequency_hz,
                ..Default::default()
            },
            registry,
        )
    }

    fn small_roi(offset_x: i32) -> RoiSettings {
        RoiSettings {
            offset_x,
            offset_y: 0,
            width: 32,
            height: 8,
            pixel_format: PixelFormat::Raw8,
        }
    }

    #[test]
    fn test_stream_and_stop() {
        let mut cam = camera(200.0);
        cam.apply_roi(&small_roi(0), 1024).unwrap();
        let sink = Arc::new(CountingSink::default());
        cam.start_capture(sink.clone()).unwrap();
        thread::sleep(Duration::from_millis(60));
        cam.stop_capture().unwrap();

        let seen = sink.frames.load(Ordering::SeqCst);
        assert!(seen > 0);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(sink.frames.load(Ordering::SeqCst), seen, "delivery after stop");
        assert!(!cam.is_streaming());
    }

    #[test]
    fn test_apply_roi_while_streaming_is_rejected() {
        let mut cam = camera(100.0);
        cam.apply_roi(&small_roi(0), 1024).unwrap();
        cam.start_capture(Arc::new(CountingSink::default())).unwrap();
        assert!(cam.apply_roi(&small_roi(4), 1024).is_err());
        assert!(cam.grab_one().is_err());
        cam.stop_capture().unwrap();
        assert!(cam.apply_roi(&small_roi(4), 1024).is_ok());
    }

    #[test]
    fn test_validate_roi_reports_reason_and_packet() {
        let cam = camera(30.0);
        let ok = cam.validate_roi(&RoiSettings::with_offset(512)).unwrap();
        assert!(ok.valid);
        assert_eq!(ok.packet.recommended_bytes_per_packet, 1280);

        let bad = cam.validate_roi(&RoiSettings::with_offset(513)).unwrap();
        assert!(!bad.valid);
        assert!(bad.reason.contains("not aligned"));
    }

    #[test]
    fn test_grab_one_follows_roi_offset() {
        let mut cam = camera(30.0);
        cam.apply_roi(&small_roi(0), 1024).unwrap();
        let a = cam.grab_one().unwrap();
        cam.apply_roi(&small_roi(4), 1024).unwrap();
        let b = cam.grab_one().unwrap();
        assert_eq!(a.data.len(), 32 * 8);
        // one sequence step plus a four column shift
        assert_eq!(b.data[0], a.data[0].wrapping_add(5));
        assert_eq!((a.offset_x, b.offset_x), (0, 4));
    }

    #[test]
    fn test_corrupted_frames_fail_conversion() {
        let roi = small_roi(0);
        let frame = MockCamera::generate_frame(&roi, 3, 3);
        let err = RgbConverter.convert_into(&frame, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ContractError::Conversion { .. }));
        assert!(RgbConverter
            .convert_into(&MockCamera::generate_frame(&roi, 4, 3), &mut Vec::new())
            .is_ok());
    }

    #[test]
    fn test_disconnect_releases_registry_and_blocks_calls() {
        let mut cam = camera(30.0);
        let registry = cam.registry.clone();
        cam.disconnect().unwrap();
        assert!(registry.lock().unwrap().is_empty());
        assert!(cam.info().is_err());
    }
}
