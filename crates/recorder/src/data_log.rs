//! Per-session timing log, one line per composite frame

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::DataRecord;

use crate::error::{RecorderError, Result};

#[derive(Debug)]
pub struct DataLog {
    path: PathBuf,
    writer: BufWriter<File>,
    lines: u64,
}

impl DataLog {
    /// Create (or truncate) the log file
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| RecorderError::io(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    pub fn append(&mut self, record: &DataRecord) -> Result<()> {
        writeln!(self.writer, "{record}").map_err(|e| RecorderError::io(&self.path, e))?;
        self.lines += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| RecorderError::io(&self.path, e))
    }

    /// Flush and close, returning the number of lines written
    pub fn close(mut self) -> Result<u64> {
        self.flush()?;
        Ok(self.lines)
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
