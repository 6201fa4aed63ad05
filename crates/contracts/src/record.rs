//! One row of the session data log.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timing of one composite frame and the two sensor frames it was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Composite frame number, starting at 0
    pub frame_number: u64,
    /// Milliseconds since session start when the frame was presented
    pub display_elapsed_ms: u64,
    /// Milliseconds since the left channel's first frame
    pub left_elapsed_ms: u64,
    /// Milliseconds since the right channel's first frame
    pub right_elapsed_ms: u64,
}

impl fmt::Display for DataRecord {
    /// Columns separated by a comma and a tab
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},\t{},\t{},\t{}",
            self.frame_number, self.display_elapsed_ms, self.left_elapsed_ms, self.right_elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_line_format() {
        let record = DataRecord {
            frame_number: 7,
            display_elapsed_ms: 1234,
            left_elapsed_ms: 1200,
            right_elapsed_ms: 1199,
        };
        assert_eq!(record.to_string(), "7,\t1234,\t1200,\t1199");
    }
}
