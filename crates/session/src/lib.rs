//! # Session
//!
//! Lifecycle of one stereo capture session.
//!
//! Responsibilities:
//! - Discover the two sensors and assign LEFT/RIGHT by serial number
//! - Connect and start both channels, tear them down on every exit path
//! - Drive the render tick and the ordered operator command stream
//! - Own the session output directory, data log and recorder
//!
//! ## Usage
//!
//! ```ignore
//! let output = SessionOutput::create(&blueprint.output.base_dir, &blueprint.output.session_name_format)?;
//! let controller = SessionController::new(blueprint, driver, output);
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//! let stats = controller.run(rx).await?;
//! stats.print_summary();
//! ```

mod context;
mod controller;
mod error;
mod output;
mod stats;

pub use controller::{RunLimits, SessionController, SideAssignment, INSTRUCTIONS};
pub use error::{Result, SessionError};
pub use output::SessionOutput;
pub use stats::SessionStats;
