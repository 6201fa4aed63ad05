//! SensorChannel - one physical sensor bound to a logical side
//!
//! Two locks guard a channel:
//! - `slot` holds the published frame and is shared with the driver thread
//!   and the synchronization gate.
//! - `control` holds the device and its configuration. It is taken by
//!   connect / configure / start / stop / adjust and never by frame delivery,
//!   so stopping (which waits for the driver thread) cannot deadlock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Instant;

use contracts::{
    CameraDevice, CameraDriver, ContractError, DeviceId, DeviceInfo, FrameSink, OffsetDirection,
    PacketInfo, PixelConverter, PixelFormat, RawFrame, RoiSettings, Side,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{CaptureError, Result};
use crate::metrics::{ChannelMetrics, ChannelMetricsSnapshot};
use crate::slot::FrameSlot;

/// Lifecycle of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    /// Device open, capture window not applied yet
    Connected,
    Configured,
    Capturing,
    /// Capture stopped for a window change
    Reconfiguring,
    Stopped,
}

struct Control {
    state: ChannelState,
    device: Option<Box<dyn CameraDevice>>,
    roi: RoiSettings,
    offset_step: u32,
    packet: PacketInfo,
    info: Option<DeviceInfo>,
}

/// Sink registered with the driver; forwards frames to its channel
struct ChannelSink {
    channel: Weak<SensorChannel>,
}

impl FrameSink for ChannelSink {
    fn deliver(&self, frame: RawFrame) {
        if let Some(channel) = self.channel.upgrade() {
            channel.on_frame(frame);
        }
    }
}

pub struct SensorChannel {
    side: Side,
    slot: Mutex<FrameSlot>,
    /// Conversion target, only touched by the delivering thread
    scratch: Mutex<Vec<u8>>,
    converter: RwLock<Option<Arc<dyn PixelConverter>>>,
    control: Mutex<Control>,
    metrics: ChannelMetrics,
    this: Weak<SensorChannel>,
}

impl SensorChannel {
    /// Create a disconnected channel.
    ///
    /// `roi` is applied on connect; `offset_step` is the alignment every
    /// horizontal offset must keep.
    pub fn new(side: Side, roi: RoiSettings, offset_step: u32) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            side,
            slot: Mutex::new(FrameSlot::new(side)),
            scratch: Mutex::new(Vec::new()),
            converter: RwLock::new(None),
            control: Mutex::new(Control {
                state: ChannelState::Disconnected,
                device: None,
                roi,
                offset_step,
                packet: PacketInfo::default(),
                info: None,
            }),
            metrics: ChannelMetrics::new(),
            this: this.clone(),
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn state(&self) -> ChannelState {
        self.lock_control().state
    }

    /// Capture window currently applied (or to be applied on connect)
    pub fn roi(&self) -> RoiSettings {
        self.lock_control().roi
    }

    pub fn offset(&self) -> i32 {
        self.lock_control().roi.offset_x
    }

    /// Packet size negotiated for the current window
    pub fn packet(&self) -> PacketInfo {
        self.lock_control().packet
    }

    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.lock_control().info.clone()
    }

    pub fn metrics(&self) -> ChannelMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Lock the frame slot.
    ///
    /// Callers locking both channels must lock LEFT before RIGHT.
    pub fn lock_slot(&self) -> MutexGuard<'_, FrameSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> Arc<dyn FrameSink> {
        Arc::new(ChannelSink {
            channel: self.this.clone(),
        })
    }

    /// Open `id`, apply the default window and size the frame buffer from one
    /// synchronously grabbed frame.
    ///
    /// On failure the device is closed again and the channel stays
    /// disconnected.
    #[instrument(name = "channel_connect", skip(self, driver), fields(side = %self.side, device = %id))]
    pub fn connect(&self, driver: &dyn CameraDriver, id: &DeviceId) -> Result<DeviceInfo> {
        let mut control = self.lock_control();
        if control.state != ChannelState::Disconnected {
            return Err(CaptureError::invalid_state(self.side, control.state, "connect"));
        }

        let mut device = driver.connect(id)?;
        control.state = ChannelState::Connected;
        match self.initialise(&mut control, device.as_mut()) {
            Ok(info) => {
                control.device = Some(device);
                control.state = ChannelState::Configured;
                Ok(info)
            }
            Err(e) => {
                if let Err(close) = device.disconnect() {
                    warn!(side = %self.side, error = %close, "disconnect after failed connect");
                }
                control.state = ChannelState::Disconnected;
                Err(e)
            }
        }
    }

    fn initialise(&self, control: &mut Control, device: &mut dyn CameraDevice) -> Result<DeviceInfo> {
        let info = device.info()?;
        info!(side = %self.side, "\n{info}");

        let caps = device.roi_capabilities()?;
        debug!(
            side = %self.side,
            max_width = caps.max_width,
            max_height = caps.max_height,
            offset_h_step = caps.offset_h_step,
            offset_v_step = caps.offset_v_step,
            image_h_step = caps.image_h_step,
            image_v_step = caps.image_v_step,
            formats = ?caps.pixel_formats,
            "roi capabilities"
        );

        let roi = control.roi;
        let packet = Self::negotiate(self.side, device, &roi, control.offset_step)?;

        // one-shot capture to learn the converted frame size
        let raw = device.grab_one()?;
        let converter = device.converter();
        let dims = {
            let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
            converter.convert_into(&raw, &mut scratch)?
        };
        {
            let mut slot = self.lock_slot();
            if !slot.allocate(dims) {
                return Err(CaptureError::BufferMismatch {
                    side: self.side,
                    allocated: slot.capacity(),
                    needed: dims.byte_len(),
                });
            }
        }
        *self.converter.write().unwrap_or_else(PoisonError::into_inner) = Some(converter);

        info!(
            side = %self.side,
            cols = dims.cols,
            rows = dims.rows,
            bytes = dims.byte_len(),
            packet = packet.recommended_bytes_per_packet,
            "frame buffer allocated"
        );
        control.packet = packet;
        control.info = Some(info.clone());
        Ok(info)
    }

    /// Validate `roi` against the device and apply it
    fn negotiate(
        side: Side,
        device: &mut dyn CameraDevice,
        roi: &RoiSettings,
        offset_step: u32,
    ) -> Result<PacketInfo> {
        if offset_step != 0 && roi.offset_x.rem_euclid(offset_step as i32) != 0 {
            return Err(ContractError::configuration_invalid(
                side,
                format!("offset {} not a multiple of {offset_step}", roi.offset_x),
            )
            .into());
        }
        let validation = device.validate_roi(roi)?;
        if !validation.valid {
            return Err(ContractError::configuration_invalid(side, validation.reason).into());
        }
        device.apply_roi(roi, validation.packet.recommended_bytes_per_packet)?;
        Ok(validation.packet)
    }

    fn converted_len(roi: &RoiSettings) -> usize {
        roi.width as usize * roi.height as usize * PixelFormat::Rgb8.bytes_per_pixel() as usize
    }

    /// Apply a new capture window while capture is not running.
    ///
    /// The frame size is fixed at connect; only the placement may change.
    #[instrument(name = "channel_configure_roi", skip(self, roi), fields(side = %self.side, offset = roi.offset_x))]
    pub fn configure_roi(&self, roi: RoiSettings) -> Result<PacketInfo> {
        let mut control = self.lock_control();
        match control.state {
            ChannelState::Configured | ChannelState::Stopped => {}
            state => return Err(CaptureError::invalid_state(self.side, state, "configure")),
        }

        let allocated = self.lock_slot().capacity();
        let needed = Self::converted_len(&roi);
        if allocated != needed {
            return Err(CaptureError::BufferMismatch {
                side: self.side,
                allocated,
                needed,
            });
        }

        let offset_step = control.offset_step;
        let device = control
            .device
            .as_mut()
            .ok_or(CaptureError::invalid_state(self.side, ChannelState::Disconnected, "configure"))?;
        let packet = Self::negotiate(self.side, device.as_mut(), &roi, offset_step)?;

        control.roi = roi;
        control.packet = packet;
        control.state = ChannelState::Configured;
        Ok(packet)
    }

    /// Begin streaming into the slot
    #[instrument(name = "channel_start", skip(self), fields(side = %self.side))]
    pub fn start(&self) -> Result<()> {
        let mut control = self.lock_control();
        match control.state {
            ChannelState::Configured | ChannelState::Stopped => {}
            state => return Err(CaptureError::invalid_state(self.side, state, "start")),
        }
        let sink = self.sink();
        let device = control
            .device
            .as_mut()
            .ok_or(CaptureError::invalid_state(self.side, ChannelState::Disconnected, "start"))?;

        self.lock_slot().set_accepting(true);
        if let Err(e) = device.start_capture(sink) {
            self.lock_slot().set_accepting(false);
            return Err(e.into());
        }
        control.state = ChannelState::Capturing;
        info!(side = %self.side, "capture started");
        Ok(())
    }

    /// Stop streaming. A no-op unless capturing.
    #[instrument(name = "channel_stop", skip(self), fields(side = %self.side))]
    pub fn stop(&self) -> Result<()> {
        let mut control = self.lock_control();
        if control.state != ChannelState::Capturing {
            return Ok(());
        }
        self.stop_locked(&mut control)
    }

    fn stop_locked(&self, control: &mut Control) -> Result<()> {
        self.lock_slot().set_accepting(false);
        control.state = ChannelState::Stopped;
        if let Some(device) = control.device.as_mut() {
            device.stop_capture()?;
        }
        info!(side = %self.side, "capture stopped");
        Ok(())
    }

    /// Stop if needed and close the device
    #[instrument(name = "channel_disconnect", skip(self), fields(side = %self.side))]
    pub fn disconnect(&self) -> Result<()> {
        let mut control = self.lock_control();
        if control.state == ChannelState::Disconnected {
            return Ok(());
        }
        let stopped = if control.state == ChannelState::Capturing {
            self.stop_locked(&mut control)
        } else {
            Ok(())
        };

        let closed = match control.device.take() {
            Some(mut device) => device.disconnect(),
            None => Ok(()),
        };
        control.state = ChannelState::Disconnected;
        *self.converter.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!(side = %self.side, "disconnected");

        stopped?;
        closed?;
        Ok(())
    }

    /// Move the capture window by one step, widening or narrowing the baseline.
    ///
    /// LEFT moves by `+magnitude` on Increase, RIGHT by `-magnitude`. Capture
    /// is stopped, the window reapplied and capture restarted while holding
    /// the control lock; frames racing into that window are discarded. If the
    /// new window is rejected the channel is left `Stopped` with its previous
    /// window.
    #[instrument(name = "channel_adjust_offset", skip(self), fields(side = %self.side))]
    pub fn adjust_offset(&self, direction: OffsetDirection, magnitude: u32) -> Result<i32> {
        let mut control = self.lock_control();
        if control.state != ChannelState::Capturing {
            return Err(CaptureError::invalid_state(
                self.side,
                control.state,
                "adjust offset",
            ));
        }

        let roi = RoiSettings {
            offset_x: control.roi.offset_x + direction.delta_for(self.side, magnitude),
            ..control.roi
        };
        let mut device = control
            .device
            .take()
            .ok_or(CaptureError::invalid_state(self.side, ChannelState::Disconnected, "adjust offset"))?;

        control.state = ChannelState::Reconfiguring;
        self.lock_slot().set_accepting(false);
        let outcome = self.restart_with(device.as_mut(), &roi, control.offset_step);
        control.device = Some(device);

        match outcome {
            Ok(packet) => {
                control.roi = roi;
                control.packet = packet;
                control.state = ChannelState::Capturing;
                info!(side = %self.side, offset = roi.offset_x, "roi offset changed");
                Ok(roi.offset_x)
            }
            Err(e) => {
                self.lock_slot().set_accepting(false);
                control.state = ChannelState::Stopped;
                warn!(side = %self.side, offset = roi.offset_x, error = %e, "reconfiguration failed, capture stopped");
                Err(e)
            }
        }
    }

    fn restart_with(
        &self,
        device: &mut dyn CameraDevice,
        roi: &RoiSettings,
        offset_step: u32,
    ) -> Result<PacketInfo> {
        device.stop_capture()?;
        let packet = Self::negotiate(self.side, device, roi, offset_step)?;
        self.lock_slot().set_accepting(true);
        device.start_capture(self.sink())?;
        Ok(packet)
    }

    /// Driver-thread entry point: convert, time and publish one frame.
    ///
    /// Conversion failures drop the frame without touching the slot.
    pub fn on_frame(&self, raw: RawFrame) {
        let now = Instant::now();
        self.metrics.record_received();

        let converter = self
            .converter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(converter) = converter else {
            self.metrics.record_discarded();
            return;
        };

        let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        let dims = match converter.convert_into(&raw, &mut scratch) {
            Ok(dims) => dims,
            Err(e) => {
                self.metrics.record_conversion_failure();
                warn!(side = %self.side, seq = raw.sequence, error = %e, "frame dropped");
                return;
            }
        };

        let mut slot = self.lock_slot();
        if !slot.is_accepting() {
            drop(slot);
            self.metrics.record_discarded();
            trace!(side = %self.side, seq = raw.sequence, "frame discarded while stopped");
            return;
        }
        let published = slot.publish(&scratch, dims, raw.offset_x, now);
        drop(slot);

        match published {
            Some(frame) => {
                self.metrics.record_published(frame.overwrote);
                debug!(
                    side = %self.side,
                    frame = frame.frame_number,
                    fps = frame.fps,
                    "New {} frame ({}) at {:.3}; {:.3} fps",
                    self.side,
                    frame.frame_number,
                    frame.elapsed.as_secs_f64(),
                    frame.fps
                );
            }
            None => {
                self.metrics.record_conversion_failure();
                warn!(
                    side = %self.side,
                    bytes = dims.byte_len(),
                    "converted frame does not fit the slot, dropped"
                );
            }
        }
    }
}
