//! Typed handle registry.
//!
//! Every native object lives in a per-category slot map and is addressed by a
//! distinct key type, so passing a buffer where a texture is expected fails to
//! compile. Keys are plain `Copy` values; `Default` yields the null handle.
//! A released handle is never reused by a later insertion (slot maps version
//! their slots), so stale handles are detected instead of aliasing.

use slotmap::{Key, SlotMap, new_key_type};

use crate::error::{GpuError, Result};
use crate::resource::BindingSlot;

new_key_type! {
    pub struct InstanceHandle;
    pub struct SurfaceHandle;
    pub struct AdapterHandle;
    pub struct DeviceHandle;
    pub struct QueueHandle;
    pub struct ShaderHandle;
    pub struct BindGroupLayoutHandle;
    pub struct PipelineLayoutHandle;
    pub struct PipelineHandle;
    pub struct BufferHandle;
    pub struct TextureHandle;
    pub struct TextureViewHandle;
    pub struct SamplerHandle;
    pub struct BindGroupHandle;
    pub struct CommandEncoderHandle;
    pub struct RenderPassHandle;
    pub struct CommandBufferHandle;
}

pub(crate) struct SurfaceRecord {
    pub surface: wgpu::Surface<'static>,
    /// Device the surface was last configured with.
    pub device: Option<wgpu::Device>,
    pub config: Option<wgpu::SurfaceConfiguration>,
    /// Last requested size; `None` until first configured. A zero dimension
    /// means configuration is deferred.
    pub size: Option<(u32, u32)>,
    /// Texture acquired for the current frame; presented or dropped.
    pub current: Option<wgpu::SurfaceTexture>,
}

pub(crate) struct AdapterRecord {
    pub adapter: wgpu::Adapter,
    /// Instance pumped while a device request is pending.
    pub instance: wgpu::Instance,
}

pub(crate) struct DeviceRecord {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Needed for surface capability queries.
    pub adapter: wgpu::Adapter,
}

pub(crate) struct BufferRecord {
    pub buffer: wgpu::Buffer,
    pub mapped: bool,
}

pub(crate) struct ViewRecord {
    pub view: wgpu::TextureView,
    /// Set when the view is a surface's frame target.
    pub frame_of: Option<SurfaceHandle>,
}

pub(crate) struct LayoutRecord {
    pub layout: wgpu::BindGroupLayout,
    pub slots: Vec<BindingSlot>,
}

pub(crate) struct EncoderRecord {
    pub encoder: wgpu::CommandEncoder,
    pub open_pass: Option<RenderPassHandle>,
}

pub(crate) struct PassRecord {
    pub pass: wgpu::RenderPass<'static>,
    pub encoder: CommandEncoderHandle,
}

/// Storage for every live native object.
#[derive(Default)]
pub(crate) struct Registry {
    pub instances: SlotMap<InstanceHandle, wgpu::Instance>,
    pub surfaces: SlotMap<SurfaceHandle, SurfaceRecord>,
    pub adapters: SlotMap<AdapterHandle, AdapterRecord>,
    pub devices: SlotMap<DeviceHandle, DeviceRecord>,
    pub queues: SlotMap<QueueHandle, wgpu::Queue>,
    pub shaders: SlotMap<ShaderHandle, wgpu::ShaderModule>,
    pub bind_group_layouts: SlotMap<BindGroupLayoutHandle, LayoutRecord>,
    pub pipeline_layouts: SlotMap<PipelineLayoutHandle, wgpu::PipelineLayout>,
    pub pipelines: SlotMap<PipelineHandle, wgpu::RenderPipeline>,
    pub buffers: SlotMap<BufferHandle, BufferRecord>,
    pub textures: SlotMap<TextureHandle, wgpu::Texture>,
    pub texture_views: SlotMap<TextureViewHandle, ViewRecord>,
    pub samplers: SlotMap<SamplerHandle, wgpu::Sampler>,
    pub bind_groups: SlotMap<BindGroupHandle, wgpu::BindGroup>,
    pub encoders: SlotMap<CommandEncoderHandle, EncoderRecord>,
    pub passes: SlotMap<RenderPassHandle, PassRecord>,
    pub command_buffers: SlotMap<CommandBufferHandle, wgpu::CommandBuffer>,
}

/// Looks up `key`, mapping null or stale handles to [`GpuError::InvalidHandle`].
pub(crate) fn get<'a, K: Key, V>(
    map: &'a SlotMap<K, V>,
    key: K,
    kind: &'static str,
) -> Result<&'a V> {
    map.get(key).ok_or_else(|| GpuError::invalid(kind))
}

pub(crate) fn get_mut<'a, K: Key, V>(
    map: &'a mut SlotMap<K, V>,
    key: K,
    kind: &'static str,
) -> Result<&'a mut V> {
    map.get_mut(key).ok_or_else(|| GpuError::invalid(kind))
}

/// Resolves an optional handle where null means "absent".
pub(crate) fn get_opt<'a, K: Key, V>(
    map: &'a SlotMap<K, V>,
    key: K,
    kind: &'static str,
) -> Result<Option<&'a V>> {
    if key.is_null() {
        return Ok(None);
    }
    get(map, key, kind).map(Some)
}
