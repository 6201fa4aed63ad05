//! # Integration Tests
//!
//! End-to-end sessions against the simulated driver.

#[cfg(test)]
mod e2e_tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{OffsetDirection, OperatorCommand, SessionBlueprint};
    use recorder::{BitmapHeader, BITMAP_HEADER_LEN};
    use sensor_driver::MockDriver;
    use session::{RunLimits, SessionController, SessionError, SessionOutput, SessionStats};
    use tokio::sync::mpsc;

    const RIG: &str = r#"
[capture]
width = 64
height = 16
vertical_offset = 0
left_offset = 64
right_offset = 32

[display]
width = 128
height = 16
tick_interval_ms = 2

[simulator]
frame_rate_hz = 200.0
"#;

    fn rig() -> SessionBlueprint {
        ConfigLoader::load_from_str(RIG, ConfigFormat::Toml).unwrap()
    }

    async fn run(
        blueprint: SessionBlueprint,
        base: &Path,
        limits: RunLimits,
        commands: &[OperatorCommand],
    ) -> (Result<SessionStats, SessionError>, SessionOutput) {
        let driver = Arc::new(MockDriver::new(blueprint.simulator.clone()));
        let output = SessionOutput::create(base, &blueprint.output.session_name_format).unwrap();
        let controller = SessionController::new(blueprint, driver, output.clone()).with_limits(limits);

        let (tx, rx) = mpsc::channel(commands.len().max(1));
        for command in commands {
            tx.send(*command).await.unwrap();
        }
        let result = controller.run(rx).await;
        drop(tx);
        (result, output)
    }

    fn bitmaps(dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|x| x == "bmp"))
            .collect();
        paths.sort();
        paths
    }

    /// Session -> data log + recorded bitmaps
    #[tokio::test]
    async fn test_recorded_session() {
        let base = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            max_frames: Some(8),
            timeout: Some(Duration::from_secs(20)),
            record: Some(true),
        };
        let (result, output) = run(rig(), base.path(), limits, &[]).await;
        let stats = result.unwrap();

        assert_eq!(stats.composite_frames, 8);
        assert_eq!(stats.recorder.written, 8);
        assert_eq!(stats.recorder.failures, 0);
        assert!(stats.left.frames_published >= 8);
        assert!(stats.right.frames_published >= 8);

        // data log: one line per composite frame, consecutive numbers
        let data = std::fs::read_to_string(output.data_log_path()).unwrap();
        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines.len(), 8);
        for (i, line) in lines.iter().enumerate() {
            let fields: Vec<&str> = line.split(",\t").collect();
            assert_eq!(fields.len(), 4, "bad line {line:?}");
            assert_eq!(fields[0].parse::<u64>().unwrap(), i as u64);
            for field in &fields[1..] {
                field.parse::<u64>().unwrap();
            }
        }

        // one bitmap per frame, full surface, decodable
        let files = bitmaps(output.dir());
        assert_eq!(files.len(), 8);
        for n in 0..8u64 {
            let path = output.dir().join(format!("{}-{}.bmp", output.base_name(), n));
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(bytes.len(), 128 * 16 * 3 + BITMAP_HEADER_LEN);
            let header = BitmapHeader::parse(&bytes).unwrap();
            assert_eq!((header.width, header.height), (128, 16));
            assert_eq!(header.bits_per_pixel, 24);
        }
        let decoded = image::open(&files[0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 16));
    }

    /// Recording toggled on then off: writes stop, display and data log go on
    #[tokio::test]
    async fn test_recording_toggle_without_recording() {
        let base = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            max_frames: Some(6),
            timeout: Some(Duration::from_secs(20)),
            record: None,
        };
        let commands = [
            OperatorCommand::ToggleRecording,
            OperatorCommand::ToggleRecording,
        ];
        let (result, output) = run(rig(), base.path(), limits, &commands).await;
        let stats = result.unwrap();

        assert_eq!(stats.composite_frames, 6);
        assert_eq!(stats.data_log_lines, 6);
        assert_eq!(stats.recorder.submitted, 0);
        assert!(bitmaps(output.dir()).is_empty());
    }

    /// N increases then N decreases restore the starting offsets
    #[tokio::test]
    async fn test_offset_round_trip() {
        let base = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            timeout: Some(Duration::from_secs(20)),
            ..Default::default()
        };
        let up = OperatorCommand::AdjustOffset(OffsetDirection::Increase);
        let down = OperatorCommand::AdjustOffset(OffsetDirection::Decrease);
        let commands = [up, up, up, down, down, down, OperatorCommand::Quit];

        let (result, _) = run(rig(), base.path(), limits, &commands).await;
        let stats = result.unwrap();
        assert_eq!(stats.final_offsets, (64, 32));
    }

    #[tokio::test]
    async fn test_offsets_after_increase() {
        let base = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            timeout: Some(Duration::from_secs(20)),
            ..Default::default()
        };
        let commands = [
            OperatorCommand::AdjustOffset(OffsetDirection::Increase),
            OperatorCommand::Quit,
        ];
        let (result, _) = run(rig(), base.path(), limits, &commands).await;
        assert_eq!(result.unwrap().final_offsets, (68, 28));
    }

    /// Corrupted frames are dropped by conversion, the session keeps going
    #[tokio::test]
    async fn test_corrupt_frames_do_not_stop_session() {
        let mut blueprint = rig();
        blueprint.simulator.failures.corrupt_every_nth_frame = 3;
        let base = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            max_frames: Some(10),
            timeout: Some(Duration::from_secs(20)),
            record: None,
        };
        let (result, _) = run(blueprint, base.path(), limits, &[]).await;
        let stats = result.unwrap();

        assert_eq!(stats.composite_frames, 10);
        assert!(stats.left.conversion_failures > 0);
        assert!(stats.right.conversion_failures > 0);
    }

    #[tokio::test]
    async fn test_too_few_cameras_is_fatal() {
        let mut blueprint = rig();
        blueprint.simulator.devices.truncate(1);
        let base = tempfile::tempdir().unwrap();
        let (result, _) = run(blueprint, base.path(), RunLimits::default(), &[]).await;
        assert!(matches!(result, Err(SessionError::TooFewDevices { found: 1 })));
    }

    #[tokio::test]
    async fn test_unreachable_camera_is_fatal() {
        let mut blueprint = rig();
        blueprint.simulator.failures.unreachable_serials = vec![blueprint.rig.left_serial];
        let base = tempfile::tempdir().unwrap();
        let (result, output) = run(blueprint, base.path(), RunLimits::default(), &[]).await;
        assert!(result.is_err());
        // nothing was written for a session that never started
        assert!(!output.data_log_path().exists());
    }

    #[tokio::test]
    async fn test_session_directory_name() {
        let base = tempfile::tempdir().unwrap();
        let limits = RunLimits {
            max_frames: Some(1),
            timeout: Some(Duration::from_secs(20)),
            record: None,
        };
        let (result, output) = run(rig(), base.path(), limits, &[]).await;
        result.unwrap();

        let name = output.base_name();
        assert_eq!(name.len(), "1019-101500".len());
        assert_eq!(&name[4..5], "-");
        assert!(name.chars().filter(|c| *c != '-').all(|c| c.is_ascii_digit()));
        assert!(output.data_log_path().exists());
    }
}
