//! Keyboard input on a dedicated thread
//!
//! The terminal is put in raw mode while the reader runs; key presses are
//! mapped to operator commands and sent in order to the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{OffsetDirection, OperatorCommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Map a key press to a command
pub fn map_key(key: &KeyEvent) -> Option<OperatorCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc => Some(OperatorCommand::Quit),
        // raw mode swallows SIGINT
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(OperatorCommand::Quit)
        }
        KeyCode::Char('f' | 'F') => Some(OperatorCommand::ToggleFullscreen),
        KeyCode::Char('r' | 'R') => Some(OperatorCommand::ToggleRecording),
        KeyCode::Up => Some(OperatorCommand::AdjustOffset(OffsetDirection::Increase)),
        KeyCode::Down => Some(OperatorCommand::AdjustOffset(OffsetDirection::Decrease)),
        _ => None,
    }
}

pub struct KeyboardInput {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl KeyboardInput {
    pub fn spawn(commands: mpsc::Sender<OperatorCommand>) -> Result<Self> {
        enable_raw_mode().context("Failed to enable terminal raw mode")?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("keyboard".to_string())
            .spawn(move || read_keys(&flag, &commands));

        match thread {
            Ok(thread) => Ok(Self {
                running,
                thread: Some(thread),
            }),
            Err(e) => {
                let _ = disable_raw_mode();
                Err(e).context("Failed to spawn keyboard thread")
            }
        }
    }
}

fn read_keys(running: &AtomicBool, commands: &mpsc::Sender<OperatorCommand>) {
    while running.load(Ordering::Acquire) {
        match event::poll(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "Keyboard poll failed");
                return;
            }
        }
        let key = match event::read() {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Keyboard read failed");
                return;
            }
        };
        if let Some(command) = map_key(&key) {
            debug!(?command, "Key mapped");
            if commands.blocking_send(command).is_err() {
                // session gone
                return;
            }
        }
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_bindings() {
        assert_eq!(map_key(&press(KeyCode::Esc)), Some(OperatorCommand::Quit));
        assert_eq!(
            map_key(&press(KeyCode::Char('f'))),
            Some(OperatorCommand::ToggleFullscreen)
        );
        assert_eq!(
            map_key(&press(KeyCode::Char('R'))),
            Some(OperatorCommand::ToggleRecording)
        );
        assert_eq!(
            map_key(&press(KeyCode::Up)),
            Some(OperatorCommand::AdjustOffset(OffsetDirection::Increase))
        );
        assert_eq!(
            map_key(&press(KeyCode::Down)),
            Some(OperatorCommand::AdjustOffset(OffsetDirection::Decrease))
        );
        assert_eq!(map_key(&press(KeyCode::Char('x'))), None);
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(OperatorCommand::Quit)
        );
    }

    #[test]
    fn test_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Esc,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(&release), None);
    }
}
