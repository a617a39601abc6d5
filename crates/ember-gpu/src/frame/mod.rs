//! Per-frame recording protocol.
//!
//! [`FrameTracker`] is the pure state machine; `recorder` drives it from the
//! [`Gpu`](crate::Gpu) frame operations.

mod recorder;
mod state;

pub use recorder::FrameOutcome;
pub use state::{FrameError, FrameEvent, FrameState, FrameStats, FrameTracker};

pub(crate) use recorder::FrameRecorder;
