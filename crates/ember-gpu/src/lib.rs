//! Ember GPU layer.
//!
//! A handle-based command surface over wgpu for a control layer that cannot
//! hold native objects itself. Every object (instance through command buffer)
//! is created through [`Gpu`] and addressed by a typed, `Copy` handle:
//!
//! - [`device`]: instance, surface, adapter, device and queue acquisition
//! - [`resource`]: buffers, textures, samplers, shaders, bind groups
//! - [`pipeline`]: one general pipeline builder plus flat-parameter shapes
//! - [`frame`]: the per-frame acquire → encode → submit → present protocol
//! - [`codes`]: numeric codes accepted at the scripting boundary
//!
//! Errors come in three classes: initialization failures and misuse are
//! `Err`, a surface that cannot provide a frame yields `Ok(None)`, and GPU-side
//! errors arrive later as [`logging::GpuDiagnostic`]s.

pub mod codes;
pub mod device;
pub mod error;
pub mod frame;
pub mod logging;
pub mod pipeline;
mod registry;
mod release;
pub mod resource;
#[cfg(test)]
mod testing;

pub use device::{Acquired, DeviceRequests, Gpu, GpuInit};
pub use error::{GpuError, Result};
pub use frame::{FrameOutcome, FrameState, FrameStats};
pub use pipeline::{FlatAttribute, FlatBlend, PipelineConfig, VertexBufferDesc};
pub use registry::{
    AdapterHandle, BindGroupHandle, BindGroupLayoutHandle, BufferHandle, CommandBufferHandle,
    CommandEncoderHandle, DeviceHandle, InstanceHandle, PipelineHandle, PipelineLayoutHandle,
    QueueHandle, RenderPassHandle, SamplerHandle, ShaderHandle, SurfaceHandle, TextureHandle,
    TextureViewHandle,
};
pub use resource::{MappedRange, gen_checkerboard};

pub use slotmap::Key;
pub use wgpu;
