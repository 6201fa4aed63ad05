//! `devices` command implementation.

use anyhow::{Context, Result};
use contracts::{CameraDriver, DeviceInfo, SessionBlueprint, Side};
use sensor_driver::MockDriver;
use serde::Serialize;
use tracing::{info, warn};

use super::load_blueprint;
use crate::cli::DevicesArgs;

#[derive(Serialize)]
struct DeviceEntry {
    index: usize,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `devices` command
pub fn run_devices(args: &DevicesArgs) -> Result<()> {
    let blueprint = load_blueprint(args.config.as_deref())?;
    let driver = MockDriver::new(blueprint.simulator.clone());
    let entries = list_devices(&driver, &blueprint)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&entries).context("Failed to serialize device list")?;
        println!("{}", json);
    } else {
        print_devices(&entries);
    }

    if entries.len() < 2 {
        warn!(found = entries.len(), "Too few cameras connected");
    }
    Ok(())
}

fn list_devices(driver: &dyn CameraDriver, blueprint: &SessionBlueprint) -> Result<Vec<DeviceEntry>> {
    let ids = driver.enumerate().context("Device enumeration failed")?;
    info!(count = ids.len(), "Cameras detected");

    Ok(ids
        .iter()
        .enumerate()
        .map(|(index, id)| match driver.probe(id) {
            Ok(info) => DeviceEntry {
                index,
                id: id.to_string(),
                side: side_of(blueprint, info.serial_number),
                info: Some(info),
                error: None,
            },
            Err(e) => DeviceEntry {
                index,
                id: id.to_string(),
                side: None,
                info: None,
                error: Some(e.to_string()),
            },
        })
        .collect())
}

fn side_of(blueprint: &SessionBlueprint, serial: u32) -> Option<Side> {
    [Side::Left, Side::Right]
        .into_iter()
        .find(|side| blueprint.serial_for(*side) == serial)
}

fn print_devices(entries: &[DeviceEntry]) {
    println!("Number of cameras detected: {}\n", entries.len());
    for entry in entries {
        let side = entry
            .side
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unassigned".to_string());
        println!("[{}] {} ({})", entry.index, entry.id, side);
        if let Some(ref info) = entry.info {
            println!("{info}\n");
        }
        if let Some(ref error) = entry.error {
            println!("  ✗ {error}\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_sides_by_serial() {
        let blueprint = SessionBlueprint::default();
        let driver = MockDriver::new(blueprint.simulator.clone());
        let entries = list_devices(&driver, &blueprint).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].side, Some(Side::Right));
        assert_eq!(entries[1].side, Some(Side::Left));
        assert_eq!(entries[1].info.as_ref().unwrap().serial_number, 14150447);
    }

    #[test]
    fn test_unreachable_device_is_reported() {
        let mut blueprint = SessionBlueprint::default();
        blueprint.simulator.failures.unreachable_serials = vec![14150448];
        let driver = MockDriver::new(blueprint.simulator.clone());
        let entries = list_devices(&driver, &blueprint).unwrap();

        assert!(entries[0].info.is_none());
        assert!(entries[0].error.is_some());
        assert!(entries[1].info.is_some());
    }
}
