//! Device acquisition and surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue behind handles
//! - blocking on the asynchronous adapter and device requests
//! - creating & configuring presentation surfaces

mod acquire;
mod error;
mod gpu;
mod init;
pub(crate) mod surface;

pub use acquire::{Acquired, DeviceRequests, acquire};
pub use error::SurfaceErrorAction;
pub use gpu::Gpu;
pub use init::GpuInit;
