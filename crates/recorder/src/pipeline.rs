//! Depth-one recording pipeline
//!
//! At most one frame is being written at any time. Submitting while a write
//! is in flight first waits for it to finish, so the display loop is
//! throttled by the disk instead of building an unbounded backlog.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::bitmap::{BitmapWriter, FrameWriter};
use crate::error::{RecorderError, Result};
use crate::metrics::RecorderMetrics;

/// One composite frame to persist
#[derive(Debug, Clone)]
pub struct RecordingJob {
    pub path: PathBuf,
    /// BGR, bottom row first
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub struct RecordingPipeline<W: FrameWriter = BitmapWriter> {
    writer: Arc<W>,
    dir: PathBuf,
    base_name: String,
    in_flight: Option<JoinHandle<()>>,
    metrics: Arc<RecorderMetrics>,
}

impl RecordingPipeline<BitmapWriter> {
    /// Bitmap pipeline writing `<dir>/<base_name>-<n>.bmp`
    pub fn bitmaps(dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self::new(dir, base_name, BitmapWriter)
    }
}

impl<W: FrameWriter> RecordingPipeline<W> {
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>, writer: W) -> Self {
        Self {
            writer: Arc::new(writer),
            dir: dir.into(),
            base_name: base_name.into(),
            in_flight: None,
            metrics: Arc::new(RecorderMetrics::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metrics(&self) -> Arc<RecorderMetrics> {
        Arc::clone(&self.metrics)
    }

    /// File name for a composite frame number
    pub fn job_path(&self, frame_number: u64) -> PathBuf {
        self.dir
            .join(format!("{}-{}.bmp", self.base_name, frame_number))
    }

    /// Build a job for `frame_number` from a surface readback
    pub fn job(&self, frame_number: u64, width: u32, height: u32, pixels: Vec<u8>) -> RecordingJob {
        RecordingJob {
            path: self.job_path(frame_number),
            pixels,
            width,
            height,
        }
    }

    /// True while a write is still running
    pub fn is_busy(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Queue a job, waiting for the previous one first
    ///
    /// Write failures are logged and counted; only a crashed worker is
    /// returned as an error.
    #[instrument(name = "recorder_submit", skip(self, job), fields(path = %job.path.display()))]
    pub async fn submit(&mut self, job: RecordingJob) -> Result<()> {
        if self.is_busy() {
            let started = Instant::now();
            self.drain().await?;
            self.metrics
                .record_wait(started.elapsed().as_micros() as u64);
        } else {
            self.drain().await?;
        }

        self.metrics.inc_submitted();
        let writer = Arc::clone(&self.writer);
        let metrics = Arc::clone(&self.metrics);
        self.in_flight = Some(tokio::task::spawn_blocking(move || {
            match writer.write(&job) {
                Ok(bytes) => {
                    metrics.record_written(bytes);
                    debug!(path = %job.path.display(), bytes, "Frame written");
                }
                Err(e) => {
                    metrics.inc_failures();
                    warn!(path = %job.path.display(), error = %e, "Frame write failed");
                }
            }
        }));
        Ok(())
    }

    /// Wait for the in-flight write, if any
    pub async fn drain(&mut self) -> Result<()> {
        match self.in_flight.take() {
            Some(handle) => handle
                .await
                .map_err(|e| RecorderError::Worker(e.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::bitmap::BitmapHeader;

    /// Records peak concurrency and the order of writes
    #[derive(Default)]
    struct SlowWriter {
        active: AtomicUsize,
        peak: AtomicUsize,
        order: std::sync::Mutex<Vec<PathBuf>>,
    }

    impl FrameWriter for SlowWriter {
        fn write(&self, job: &RecordingJob) -> Result<u64> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.order.lock().unwrap().push(job.path.clone());
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(job.pixels.len() as u64)
        }
    }

    struct FailingWriter;

    impl FrameWriter for FailingWriter {
        fn write(&self, job: &RecordingJob) -> Result<u64> {
            Err(RecorderError::io(
                &job.path,
                std::io::Error::other("disk full"),
            ))
        }
    }

    #[test]
    fn test_job_path() {
        let pipeline = RecordingPipeline::bitmaps("image_data/1019-101500", "1019-101500");
        assert_eq!(
            pipeline.job_path(12),
            Path::new("image_data/1019-101500").join("1019-101500-12.bmp")
        );
    }

    #[tokio::test]
    async fn test_one_write_at_a_time() {
        let mut pipeline = RecordingPipeline::new("out", "s", SlowWriter::default());
        for n in 1..=5 {
            let job = pipeline.job(n, 2, 2, vec![0; 12]);
            pipeline.submit(job).await.unwrap();
        }
        pipeline.drain().await.unwrap();

        let writer = Arc::clone(&pipeline.writer);
        assert_eq!(writer.peak.load(Ordering::SeqCst), 1);
        let order = writer.order.lock().unwrap().clone();
        let expected: Vec<_> = (1..=5).map(|n| pipeline.job_path(n)).collect();
        assert_eq!(order, expected);

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.submitted, 5);
        assert_eq!(snapshot.written, 5);
        assert!(snapshot.waits >= 1);
    }

    #[tokio::test]
    async fn test_submit_waits_for_previous() {
        let mut pipeline = RecordingPipeline::new("out", "s", SlowWriter::default());
        pipeline.submit(pipeline.job(1, 1, 1, vec![0; 3])).await.unwrap();
        assert!(pipeline.is_busy());

        let started = Instant::now();
        pipeline.submit(pipeline.job(2, 1, 1, vec![0; 3])).await.unwrap();
        // the first write held the second submission back
        assert!(started.elapsed() >= Duration::from_millis(5));
        assert_eq!(pipeline.writer.order.lock().unwrap().len(), 1);

        pipeline.drain().await.unwrap();
        assert!(!pipeline.is_busy());
        assert_eq!(pipeline.writer.order.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_is_counted() {
        let mut pipeline = RecordingPipeline::new("out", "s", FailingWriter);
        pipeline.submit(pipeline.job(1, 1, 1, vec![0; 3])).await.unwrap();
        pipeline.drain().await.unwrap();
        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.written, 0);
    }

    #[tokio::test]
    async fn test_bitmaps_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = RecordingPipeline::bitmaps(dir.path(), "session");
        let (w, h) = (8u32, 4u32);
        for n in 1..=3u64 {
            let pixels = vec![n as u8; (w * h * 3) as usize];
            pipeline.submit(pipeline.job(n, w, h, pixels)).await.unwrap();
        }
        pipeline.drain().await.unwrap();

        for n in 1..=3u64 {
            let path = dir.path().join(format!("session-{n}.bmp"));
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(bytes.len(), (w * h * 3) as usize + 54);
            let header = BitmapHeader::parse(&bytes).unwrap();
            assert_eq!((header.width, header.height), (8, 4));
            assert!(bytes[54..].iter().all(|&b| b == n as u8));
        }
        assert_eq!(pipeline.metrics().written(), 3);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = RecordingPipeline::bitmaps(dir.path().join("absent"), "s");
        pipeline.submit(pipeline.job(1, 4, 1, vec![0; 12])).await.unwrap();
        pipeline.drain().await.unwrap();
        assert_eq!(pipeline.metrics().failures(), 1);
    }
}
