//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SessionBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    left_serial: u32,
    right_serial: u32,
    capture_window: String,
    left_offset: i32,
    right_offset: i32,
    display: String,
    layout: String,
    output_dir: String,
    simulated_devices: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let (result, blueprint) = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if args.normalized {
        if let Some(ref blueprint) = blueprint {
            let toml = config_loader::ConfigLoader::to_toml(blueprint)
                .context("Failed to render normalized configuration")?;
            println!("\n# normalized configuration\n{toml}");
        }
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> (ValidationResult, Option<SessionBlueprint>) {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        let result = ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
        return (result, None);
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let result = ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            };
            (result, Some(blueprint))
        }
        Err(e) => (
            ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            },
            None,
        ),
    }
}

fn summarize(blueprint: &SessionBlueprint) -> ConfigSummary {
    let capture = &blueprint.capture;
    let display = &blueprint.display;
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        left_serial: blueprint.rig.left_serial,
        right_serial: blueprint.rig.right_serial,
        capture_window: format!(
            "{}x{} at y={} ({:?})",
            capture.width, capture.height, capture.vertical_offset, capture.pixel_format
        ),
        left_offset: capture.left_offset,
        right_offset: capture.right_offset,
        display: format!("{}x{}", display.width, display.height),
        layout: format!("{:?}", display.layout),
        output_dir: blueprint.output.base_dir.clone(),
        simulated_devices: blueprint.simulator.devices.len(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SessionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.display.width % 4 != 0 {
        warnings.push(format!(
            "display.width {} is not a multiple of 4 - recorded bitmaps have unpadded rows some viewers reject",
            blueprint.display.width
        ));
    }

    if blueprint.display.width < blueprint.capture.width * 2 {
        warnings.push(format!(
            "display.width {} is narrower than two capture windows ({}) - halves are downscaled",
            blueprint.display.width,
            blueprint.capture.width * 2
        ));
    }

    let serials: Vec<u32> = blueprint.simulator.devices.iter().map(|d| d.serial).collect();
    for (name, serial) in [
        ("left", blueprint.rig.left_serial),
        ("right", blueprint.rig.right_serial),
    ] {
        if !serials.contains(&serial) {
            warnings.push(format!(
                "rig.{name}_serial {serial} is not among the simulated devices"
            ));
        }
    }

    if blueprint.output.record_on_start {
        warnings.push("output.record_on_start is set - every composite frame is written to disk".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Serials: left {} / right {}",
                summary.left_serial, summary.right_serial
            );
            println!("  Capture window: {}", summary.capture_window);
            println!(
                "  Offsets: left {} / right {}",
                summary.left_offset, summary.right_offset
            );
            println!("  Display: {} ({})", summary.display, summary.layout);
            println!("  Output: {}", summary.output_dir);
            println!("  Simulated devices: {}", summary.simulated_devices);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_warn_about_downscaling() {
        let warnings = collect_warnings(&SessionBlueprint::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("downscaled"));
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/stereocam.toml".into(),
            json: false,
            normalized: false,
        };
        let (result, blueprint) = validate_config(&args);
        assert!(!result.valid);
        assert!(blueprint.is_none());
    }

    #[test]
    fn test_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.toml");
        std::fs::write(&path, "[capture]\nleft_offset = 516\n").unwrap();
        let args = ValidateArgs {
            config: path,
            json: true,
            normalized: true,
        };
        let (result, blueprint) = validate_config(&args);
        assert!(result.valid, "{:?}", result.error);
        assert_eq!(blueprint.unwrap().capture.left_offset, 516);
        assert_eq!(result.summary.unwrap().left_offset, 516);
    }
}
