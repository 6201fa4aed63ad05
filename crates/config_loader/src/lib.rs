//! # Config Loader
//!
//! Loads the session blueprint of the stereo rig.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate offsets, window bounds, serials and display settings
//! - Produce a `SessionBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("rig.toml")).unwrap();
//! println!("left serial: {}", blueprint.rig.left_serial);
//! ```

mod parser;
mod validator;

pub use contracts::SessionBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Loads rig blueprints; every entry point validates before returning
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read a `.toml` or `.json` rig file
    pub fn load_from_path(path: &Path) -> Result<SessionBlueprint, ContractError> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ConfigFormat::from_extension)
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "unsupported config format: {} (expected .toml or .json)",
                    path.display()
                ))
            })?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContractError::config_parse(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::load_from_str(&content, format)
    }

    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SessionBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Built-in rig, used when no file is given
    pub fn defaults() -> Result<SessionBlueprint, ContractError> {
        let blueprint = SessionBlueprint::default();
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Re-check a blueprint after command-line overrides
    pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Normalized TOML, as printed by `validate --normalized`
    pub fn to_toml(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RIG_TOML: &str = r#"
[rig]
left_serial = 14150447
right_serial = 14150448

[capture]
left_offset = 516
right_offset = 284

[output]
base_dir = "captures"
record_on_start = true
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(RIG_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.capture.left_offset, 516);
        assert_eq!(bp.output.base_dir, "captures");
        assert!(bp.output.record_on_start);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(RIG_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp, bp2);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(RIG_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp, bp2);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[capture]\nleft_offset = 513\n";
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("not aligned"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(RIG_TOML.as_bytes()).unwrap();
        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.capture.right_offset, 284);
    }

    #[test]
    fn test_load_from_path_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_path_names_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(ConfigLoader::defaults().is_ok());
    }
}
