//! Discrete operator commands routed by the session.

use serde::{Deserialize, Serialize};

use crate::OffsetDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCommand {
    /// Leave the render loop and shut the rig down
    Quit,
    ToggleFullscreen,
    ToggleRecording,
    /// Change stereo spacing
    AdjustOffset(OffsetDirection),
}

impl OperatorCommand {
    /// Line written to the event log when the command is received
    pub fn describe(&self) -> &'static str {
        match self {
            OperatorCommand::Quit => "Esc pressed --> leave main loop",
            OperatorCommand::ToggleFullscreen => "F --> toggle fullscreen",
            OperatorCommand::ToggleRecording => "R --> toggle recording",
            OperatorCommand::AdjustOffset(OffsetDirection::Increase) => {
                "Up pressed --> increase stereo spacing"
            }
            OperatorCommand::AdjustOffset(OffsetDirection::Decrease) => {
                "Down pressed --> decrease stereo spacing"
            }
        }
    }
}
