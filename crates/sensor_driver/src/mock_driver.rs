//! Mock driver
//!
//! Implements `CameraDriver` over a list of simulated devices, supports
//! injecting unreachable devices.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{
    CameraDevice, CameraDriver, ContractError, DeviceId, DeviceInfo, SimulatorConfig,
};
use tracing::{info, instrument, warn};

use crate::mock_camera::{MockCamera, MockCameraConfig};

/// Mock driver
pub struct MockDriver {
    config: SimulatorConfig,
    /// Devices with a live connection
    connected: Arc<Mutex<HashSet<DeviceId>>>,
}

impl MockDriver {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            connected: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Bus identifier of a simulated serial
    pub fn device_id_for(serial: u32) -> DeviceId {
        DeviceId::new(&format!("sim-{serial}"))
    }

    /// Number of devices with an open connection
    pub fn open_connections(&self) -> usize {
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lookup(&self, id: &DeviceId) -> Result<u32, ContractError> {
        self.config
            .devices
            .iter()
            .map(|d| d.serial)
            .find(|serial| Self::device_id_for(*serial) == *id)
            .ok_or_else(|| ContractError::device_connect(id.as_str(), "no such device on the bus"))
    }

    fn device_info(&self, serial: u32) -> DeviceInfo {
        let model = self
            .config
            .devices
            .iter()
            .find(|d| d.serial == serial)
            .map(|d| d.model.clone())
            .unwrap_or_default();
        let caps = &self.config.capabilities;
        DeviceInfo {
            serial_number: serial,
            model_name: model,
            vendor_name: "Point Grey Research (simulated)".to_string(),
            sensor_info: "Sony IMX036 (1/2.8\" Color CMOS)".to_string(),
            sensor_resolution: format!("{}x{}", caps.max_width, caps.max_height),
            firmware_version: "2.6.3.0".to_string(),
            firmware_build_time: "Mon Jan 13 00:00:00 2014".to_string(),
        }
    }
}

impl CameraDriver for MockDriver {
    fn enumerate(&self) -> Result<Vec<DeviceId>, ContractError> {
        let ids: Vec<DeviceId> = self
            .config
            .devices
            .iter()
            .map(|d| Self::device_id_for(d.serial))
            .collect();
        info!(count = ids.len(), "number of cameras detected");
        Ok(ids)
    }

    fn probe(&self, id: &DeviceId) -> Result<DeviceInfo, ContractError> {
        let serial = self.lookup(id)?;
        if self.config.failures.unreachable_serials.contains(&serial) {
            return Err(ContractError::device_connect(id.as_str(), "device unreachable"));
        }
        Ok(self.device_info(serial))
    }

    #[instrument(name = "mock_driver_connect", skip(self), fields(device = %id))]
    fn connect(&self, id: &DeviceId) -> Result<Box<dyn CameraDevice>, ContractError> {
        let serial = self.lookup(id)?;
        if self.config.failures.unreachable_serials.contains(&serial) {
            warn!(serial, "injected connection failure");
            return Err(ContractError::device_connect(id.as_str(), "device unreachable"));
        }

        let mut connected = self
            .connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !connected.insert(id.clone()) {
            return Err(ContractError::device_connect(
                id.as_str(),
                "device already has a live connection",
            ));
        }
        drop(connected);

        let camera = MockCamera::new(
            id.clone(),
            self.device_info(serial),
            MockCameraConfig {
                frequency_hz: self.config.frame_rate_hz,
                capabilities: self.config.capabilities.clone(),
                corrupt_every_nth_frame: self.config.failures.corrupt_every_nth_frame,
            },
            self.connected.clone(),
        );
        Ok(Box::new(camera))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SimulatedDevice;

    fn two_cameras() -> SimulatorConfig {
        SimulatorConfig {
            devices: vec![
                SimulatedDevice {
                    serial: 11,
                    model: "a".into(),
                },
                SimulatedDevice {
                    serial: 22,
                    model: "b".into(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_enumerate_in_bus_order() {
        let driver = MockDriver::new(two_cameras());
        let ids = driver.enumerate().unwrap();
        assert_eq!(ids, vec![DeviceId::new("sim-11"), DeviceId::new("sim-22")]);
    }

    #[test]
    fn test_probe_reports_serial_and_model() {
        let driver = MockDriver::new(two_cameras());
        let info = driver.probe(&DeviceId::new("sim-22")).unwrap();
        assert_eq!(info.serial_number, 22);
        assert_eq!(info.model_name, "b");
        assert_eq!(info.sensor_resolution, "2080x1552");
    }

    #[test]
    fn test_single_live_connection_per_device() {
        let driver = MockDriver::new(two_cameras());
        let id = DeviceId::new("sim-11");
        let mut cam = driver.connect(&id).unwrap();
        assert!(matches!(
            driver.connect(&id),
            Err(ContractError::DeviceConnect { .. })
        ));
        cam.disconnect().unwrap();
        assert_eq!(driver.open_connections(), 0);
        assert!(driver.connect(&id).is_ok());
    }

    #[test]
    fn test_dropping_camera_releases_connection() {
        let driver = MockDriver::new(two_cameras());
        let cam = driver.connect(&DeviceId::new("sim-22")).unwrap();
        assert_eq!(driver.open_connections(), 1);
        drop(cam);
        assert_eq!(driver.open_connections(), 0);
    }

    #[test]
    fn test_unreachable_device() {
        let mut config = two_cameras();
        config.failures.unreachable_serials = vec![22];
        let driver = MockDriver::new(config);
        assert!(driver.connect(&DeviceId::new("sim-22")).is_err());
        assert!(driver.probe(&DeviceId::new("sim-22")).is_err());
        assert!(driver.connect(&DeviceId::new("sim-99")).is_err());
    }
}
