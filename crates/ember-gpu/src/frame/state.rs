use std::fmt;

use thiserror::Error;

/// Phase of the per-frame recording protocol.
///
/// `Idle → ViewAcquired → Encoding ⇄ InPass → Finished → Submitted → Presented`.
/// `Presented` behaves like `Idle` for the next acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    Idle,
    ViewAcquired,
    Encoding,
    InPass,
    Finished,
    Submitted,
    Presented,
}

/// Protocol step applied to a [`FrameTracker`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameEvent {
    /// The surface produced a frame target.
    Acquire,
    /// The surface could not produce an optimal target; the cycle is skipped.
    AcquireSkipped,
    OpenEncoder,
    BeginPass,
    /// Any draw or draw-indexed call.
    Draw,
    /// Any other in-pass command (pipeline, buffers, bind groups, viewport).
    PassCommand,
    EndPass,
    Finish,
    Submit,
    Present,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for FrameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameError {
    #[error("frame protocol: {event} is not valid in state {state}")]
    InvalidTransition { state: FrameState, event: FrameEvent },
}

/// Counters for the current cycle; reset on each acquisition attempt.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draws: u32,
    pub passes_ended: u32,
    pub submissions: u32,
    pub presents: u32,
    /// Acquisition attempts that were skipped since the last presented frame.
    pub skipped: u32,
}

/// Pure state machine for one frame in flight.
///
/// Holds no GPU objects; the registry drives it alongside the native calls so
/// that an out-of-order call is rejected before it reaches the native layer.
#[derive(Debug, Clone)]
pub struct FrameTracker {
    state: FrameState,
    stats: FrameStats,
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTracker {
    pub fn new() -> Self {
        Self {
            state: FrameState::Idle,
            stats: FrameStats::default(),
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// `true` between a successful acquisition and the matching present.
    pub fn in_progress(&self) -> bool {
        !matches!(self.state, FrameState::Idle | FrameState::Presented)
    }

    /// Applies `event`, returning the new state or rejecting the step.
    ///
    /// A rejected step leaves the tracker unchanged.
    pub fn apply(&mut self, event: FrameEvent) -> Result<FrameState, FrameError> {
        use FrameEvent as E;
        use FrameState as S;

        let next = match (self.state, event) {
            (S::Idle | S::Presented, E::Acquire) => {
                let skipped = if self.state == S::Idle { self.stats.skipped } else { 0 };
                self.stats = FrameStats { skipped, ..FrameStats::default() };
                S::ViewAcquired
            }
            (S::Idle | S::Presented, E::AcquireSkipped) => {
                let skipped = if self.state == S::Idle { self.stats.skipped } else { 0 };
                self.stats = FrameStats {
                    skipped: skipped + 1,
                    ..FrameStats::default()
                };
                S::Idle
            }
            (S::ViewAcquired, E::OpenEncoder) => S::Encoding,
            (S::Encoding, E::BeginPass) => S::InPass,
            (S::InPass, E::PassCommand) => S::InPass,
            (S::InPass, E::Draw) => {
                self.stats.draws += 1;
                S::InPass
            }
            (S::InPass, E::EndPass) => {
                self.stats.passes_ended += 1;
                S::Encoding
            }
            (S::Encoding, E::Finish) => S::Finished,
            (S::Finished, E::Submit) => {
                self.stats.submissions += 1;
                S::Submitted
            }
            (S::Submitted, E::Present) => {
                self.stats.presents += 1;
                S::Presented
            }
            (state, event) => return Err(FrameError::InvalidTransition { state, event }),
        };

        self.state = next;
        Ok(next)
    }

    /// Validates `event` without applying it.
    pub fn check(&self, event: FrameEvent) -> Result<(), FrameError> {
        self.clone().apply(event).map(|_| ())
    }

    /// Drops the frame in progress without presenting it.
    pub fn abandon(&mut self) {
        self.state = FrameState::Idle;
    }
}
