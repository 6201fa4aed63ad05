//! # Sync Engine
//!
//! Pairs the two capture channels and composes the stereo frame.
//!
//! Responsibilities:
//! - Gate: report a pair only when both channels hold an unconsumed frame,
//!   consuming both flags together
//! - Compose both halves onto one surface and present it
//! - Track the display rate and produce the data-log record of every
//!   composite frame
//!
//! ## Usage
//!
//! ```ignore
//! use sync_engine::{CompositeRenderer, SoftwareSurface, SynchronizationGate};
//!
//! let gate = SynchronizationGate::new(left, right);
//! let mut renderer = CompositeRenderer::new(gate, Box::new(SoftwareSurface::new(1280, 720)), layout);
//!
//! // once per tick
//! if let Some(frame) = renderer.tick() {
//!     data_log.append(&frame.record)?;
//! }
//! ```

mod gate;
mod renderer;
mod surface;

pub use gate::{FramePair, SynchronizationGate};
pub use renderer::{CompositeFrame, CompositeRenderer};
pub use surface::SoftwareSurface;
