//! Error types for the GPU layer.
//!
//! Only synchronous failures surface here. Per-frame surface trouble is not an
//! error (acquisition yields `None` and the frame is skipped), and GPU-side
//! validation failures arrive later as [`GpuDiagnostic`](crate::logging::GpuDiagnostic)
//! events.

use std::time::Duration;

use thiserror::Error;

use crate::frame::FrameError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GpuError>;

#[derive(Error, Debug)]
pub enum GpuError {
    // ── initialization (fatal) ───────────────────────────────────────────
    /// No adapter satisfied the request.
    #[error("adapter request failed: {0}")]
    AdapterUnavailable(String),

    /// The adapter refused to create a device.
    #[error("device request failed: {0}")]
    DeviceUnavailable(String),

    /// A blocking request did not complete before its deadline.
    #[error("{what} request did not complete within {after:?}")]
    RequestTimedOut { what: &'static str, after: Duration },

    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// The surface reported that it ran out of memory while acquiring a frame.
    #[error("surface out of memory")]
    SurfaceOutOfMemory,

    #[error("surface has not been configured")]
    SurfaceNotConfigured,

    /// The adapter reports no usable format for the surface.
    #[error("surface is not supported by the adapter")]
    SurfaceUnsupported,

    // ── handles ──────────────────────────────────────────────────────────
    /// Null, released or stale handle.
    #[error("invalid {kind} handle")]
    InvalidHandle { kind: &'static str },

    // ── frame protocol ───────────────────────────────────────────────────
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The command encoder still has an open render pass.
    #[error("render pass still open on command encoder")]
    PassStillOpen,

    #[error("draw range {first} + {count} overflows u32")]
    DrawRangeOverflow { first: u32, count: u32 },

    // ── resources ────────────────────────────────────────────────────────
    #[error("buffer is not mapped")]
    BufferNotMapped,

    #[error("mapped range access {offset}..{end} exceeds range of {len} bytes")]
    MappedRangeOutOfBounds { offset: u64, end: u64, len: u64 },

    /// A bound buffer range is empty or does not fit in the buffer.
    /// `size` 0 is the rest-of-buffer request.
    #[error("buffer range at {offset} (size {size}) is empty or exceeds buffer of {len} bytes")]
    BufferRangeOutOfBounds { offset: u64, size: u64, len: u64 },

    #[error("bind group does not match layout: {0}")]
    LayoutMismatch(String),

    #[error("texture upload of {len} bytes is too short for {rows} rows of {bytes_per_row} bytes")]
    TextureDataTooShort { len: usize, rows: u32, bytes_per_row: u32 },

    // ── pipelines ────────────────────────────────────────────────────────
    #[error("pipeline shape: {0}")]
    PipelineShape(String),

    // ── scripting boundary ───────────────────────────────────────────────
    #[error("unknown {kind} code {code}")]
    UnknownCode { kind: &'static str, code: u32 },
}

impl GpuError {
    pub(crate) fn invalid(kind: &'static str) -> Self {
        GpuError::InvalidHandle { kind }
    }
}
