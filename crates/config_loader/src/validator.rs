//! Configuration validation
//!
//! Rules:
//! - left and right serials are distinct and non-zero
//! - capture window is non-empty and fits the sensor width
//! - every horizontal offset (and the adjust step) is aligned to `offset_step`
//! - display size and tick interval are non-zero
//! - output location and session name format are present
//! - simulator frame rate > 0, simulated serials unique

use std::collections::HashSet;

use contracts::{ContractError, SessionBlueprint, Side};

/// Validate a SessionBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    validate_rig(blueprint)?;
    validate_capture(blueprint)?;
    validate_display(blueprint)?;
    validate_output(blueprint)?;
    validate_simulator(blueprint)?;
    Ok(())
}

fn validate_rig(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let rig = &blueprint.rig;
    if rig.left_serial == 0 || rig.right_serial == 0 {
        return Err(ContractError::config_validation(
            "rig",
            "serial numbers must be non-zero",
        ));
    }
    if rig.left_serial == rig.right_serial {
        return Err(ContractError::config_validation(
            "rig.right_serial",
            format!("duplicate serial {} for left and right", rig.left_serial),
        ));
    }
    Ok(())
}

fn validate_capture(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let capture = &blueprint.capture;
    if capture.width == 0 || capture.height == 0 {
        return Err(ContractError::config_validation(
            "capture.width / capture.height",
            "capture window must be non-empty",
        ));
    }
    if capture.offset_step == 0 {
        return Err(ContractError::config_validation(
            "capture.offset_step",
            "offset_step must be > 0",
        ));
    }
    if capture.adjust_magnitude == 0 || capture.adjust_magnitude % capture.offset_step != 0 {
        return Err(ContractError::config_validation(
            "capture.adjust_magnitude",
            format!(
                "adjust_magnitude ({}) must be a non-zero multiple of offset_step ({})",
                capture.adjust_magnitude, capture.offset_step
            ),
        ));
    }
    if capture.vertical_offset < 0 {
        return Err(ContractError::config_validation(
            "capture.vertical_offset",
            "vertical_offset must not be negative",
        ));
    }

    let max_width = blueprint.simulator.capabilities.max_width;
    for side in Side::BOTH {
        let offset = capture.offset_for(side);
        let field = format!("capture.{side}_offset");
        if offset < 0 {
            return Err(ContractError::config_validation(
                field,
                format!("offset must not be negative, got {offset}"),
            ));
        }
        if offset % capture.offset_step as i32 != 0 {
            return Err(ContractError::config_validation(
                field,
                format!(
                    "offset {offset} not aligned to offset_step {}",
                    capture.offset_step
                ),
            ));
        }
        if offset as u64 + capture.width as u64 > max_width as u64 {
            return Err(ContractError::config_validation(
                field,
                format!(
                    "offset {offset} + width {} exceeds sensor width {max_width}",
                    capture.width
                ),
            ));
        }
    }
    Ok(())
}

fn validate_display(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let display = &blueprint.display;
    if display.width == 0 || display.height == 0 {
        return Err(ContractError::config_validation(
            "display.width / display.height",
            "display size must be non-zero",
        ));
    }
    if display.tick_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "display.tick_interval_ms",
            "tick interval must be > 0",
        ));
    }
    Ok(())
}

fn validate_output(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let output = &blueprint.output;
    if output.base_dir.trim().is_empty() {
        return Err(ContractError::config_validation(
            "output.base_dir",
            "base_dir cannot be empty",
        ));
    }
    if output.session_name_format.trim().is_empty() {
        return Err(ContractError::config_validation(
            "output.session_name_format",
            "session_name_format cannot be empty",
        ));
    }
    Ok(())
}

fn validate_simulator(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let simulator = &blueprint.simulator;
    if !(simulator.frame_rate_hz.is_finite() && simulator.frame_rate_hz > 0.0) {
        return Err(ContractError::config_validation(
            "simulator.frame_rate_hz",
            format!(
                "frame_rate_hz must be > 0, got {}",
                simulator.frame_rate_hz
            ),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, device) in simulator.devices.iter().enumerate() {
        if !seen.insert(device.serial) {
            return Err(ContractError::config_validation(
                format!("simulator.devices[{idx}].serial"),
                format!("duplicate serial {}", device.serial),
            ));
        }
    }
    Ok(())
}
