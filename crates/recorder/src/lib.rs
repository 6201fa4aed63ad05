//! # Recorder
//!
//! Persistence of a capture session.
//!
//! Responsibilities:
//! - Encode composite frames as uncompressed 24-bit bitmaps
//! - Write them one at a time on a blocking worker (queue depth 1): a new
//!   job waits for the previous write, nothing is dropped or queued further
//! - Append one timing record per composite frame to the data log

pub mod bitmap;
pub mod data_log;
pub mod error;
pub mod metrics;
pub mod pipeline;

pub use bitmap::{BitmapHeader, BitmapWriter, FrameWriter, BITMAP_HEADER_LEN};
pub use data_log::DataLog;
pub use error::{RecorderError, Result};
pub use metrics::{RecorderMetrics, RecorderMetricsSnapshot};
pub use pipeline::{RecordingJob, RecordingPipeline};
