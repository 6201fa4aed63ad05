//! Session output directory
//!
//! `<base_dir>/<name>/` holding `<name>_data.txt`, `<name>_log.txt` and the
//! recorded `<name>-<n>.bmp` frames, where `<name>` is the session start
//! time rendered with the configured chrono format.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Result, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    dir: PathBuf,
    base_name: String,
}

impl SessionOutput {
    /// Create the directory for a session starting now
    pub fn create(base_dir: impl AsRef<Path>, name_format: &str) -> Result<Self> {
        Self::create_at(base_dir, name_format, Local::now())
    }

    pub fn create_at(
        base_dir: impl AsRef<Path>,
        name_format: &str,
        started: DateTime<Local>,
    ) -> Result<Self> {
        let base_name = session_name(name_format, started)?;
        let dir = base_dir.as_ref().join(&base_name);
        std::fs::create_dir_all(&dir).map_err(|e| SessionError::output(&dir, e))?;
        Ok(Self { dir, base_name })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn data_log_path(&self) -> PathBuf {
        self.dir.join(format!("{}_data.txt", self.base_name))
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.dir.join(format!("{}_log.txt", self.base_name))
    }
}

fn session_name(format: &str, started: DateTime<Local>) -> Result<String> {
    let mut name = String::new();
    write!(name, "{}", started.format(format)).map_err(|_| SessionError::name_format(format))?;
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(SessionError::name_format(format));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 9, 5, 7).unwrap()
    }

    #[test]
    fn test_layout() {
        let base = tempfile::tempdir().unwrap();
        let output = SessionOutput::create_at(base.path(), "%m%d-%H%M%S", started()).unwrap();

        assert_eq!(output.base_name(), "1019-090507");
        assert_eq!(output.dir(), base.path().join("1019-090507"));
        assert!(output.dir().is_dir());
        assert_eq!(
            output.data_log_path(),
            base.path().join("1019-090507").join("1019-090507_data.txt")
        );
        assert_eq!(
            output.event_log_path(),
            base.path().join("1019-090507").join("1019-090507_log.txt")
        );
    }

    #[test]
    fn test_existing_directory_is_reused() {
        let base = tempfile::tempdir().unwrap();
        SessionOutput::create_at(base.path(), "%m%d-%H%M%S", started()).unwrap();
        assert!(SessionOutput::create_at(base.path(), "%m%d-%H%M%S", started()).is_ok());
    }

    #[test]
    fn test_bad_format() {
        let base = tempfile::tempdir().unwrap();
        assert!(matches!(
            SessionOutput::create_at(base.path(), "%Q", started()),
            Err(SessionError::NameFormat { .. })
        ));
        assert!(matches!(
            SessionOutput::create_at(base.path(), "%Y/%m", started()),
            Err(SessionError::NameFormat { .. })
        ));
    }
}
