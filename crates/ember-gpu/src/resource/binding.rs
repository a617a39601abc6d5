use std::num::NonZeroU64;

use crate::device::Gpu;
use crate::error::{GpuError, Result};
use crate::registry::{
    BindGroupHandle, BindGroupLayoutHandle, BufferHandle, DeviceHandle, LayoutRecord,
    PipelineLayoutHandle, SamplerHandle, TextureViewHandle, get,
};

/// Resource kind a layout slot accepts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotKind {
    UniformBuffer,
    /// Filterable float 2D texture.
    Texture,
    /// Filtering sampler.
    Sampler,
}

/// One declared slot of a bind-group layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingSlot {
    pub binding: u32,
    pub kind: SlotKind,
    pub visibility: wgpu::ShaderStages,
}

impl BindingSlot {
    fn layout_entry(&self, min_binding_size: Option<NonZeroU64>) -> wgpu::BindGroupLayoutEntry {
        let ty = match self.kind {
            SlotKind::UniformBuffer => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size,
            },
            SlotKind::Texture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            SlotKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        };
        wgpu::BindGroupLayoutEntry {
            binding: self.binding,
            visibility: self.visibility,
            ty,
            count: None,
        }
    }
}

/// Checks that `entries` supply the layout's slots one-for-one, in order.
pub(crate) fn match_layout(slots: &[BindingSlot], entries: &[(u32, SlotKind)]) -> Result<()> {
    if slots.len() != entries.len() {
        return Err(GpuError::LayoutMismatch(format!(
            "layout declares {} slots, got {} entries",
            slots.len(),
            entries.len()
        )));
    }
    for (i, (slot, &(binding, kind))) in slots.iter().zip(entries).enumerate() {
        if slot.binding != binding {
            return Err(GpuError::LayoutMismatch(format!(
                "entry {i} uses binding {binding}, layout expects {}",
                slot.binding
            )));
        }
        if slot.kind != kind {
            return Err(GpuError::LayoutMismatch(format!(
                "binding {binding} is {:?}, got {kind:?}",
                slot.kind
            )));
        }
    }
    Ok(())
}

impl Gpu {
    fn insert_layout(
        &mut self,
        device: DeviceHandle,
        slots: Vec<BindingSlot>,
        min_binding_size: Option<NonZeroU64>,
    ) -> Result<BindGroupLayoutHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let entries: Vec<_> = slots
            .iter()
            .map(|s| s.layout_entry(min_binding_size))
            .collect();
        let layout = dev.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &entries,
        });
        let handle = self
            .reg
            .bind_group_layouts
            .insert(LayoutRecord { layout, slots });
        log::trace!("created bind group layout {handle:?}");
        Ok(handle)
    }

    /// Layout with one uniform buffer slot. `min_binding_size` 0 means unchecked.
    pub fn create_uniform_bind_group_layout(
        &mut self,
        device: DeviceHandle,
        binding: u32,
        visibility: wgpu::ShaderStages,
        min_binding_size: u64,
    ) -> Result<BindGroupLayoutHandle> {
        let slot = BindingSlot {
            binding,
            kind: SlotKind::UniformBuffer,
            visibility,
        };
        self.insert_layout(device, vec![slot], NonZeroU64::new(min_binding_size))
    }

    /// Layout with one texture slot followed by one sampler slot.
    pub fn create_texture_sampler_bind_group_layout(
        &mut self,
        device: DeviceHandle,
        texture_binding: u32,
        texture_visibility: wgpu::ShaderStages,
        sampler_binding: u32,
        sampler_visibility: wgpu::ShaderStages,
    ) -> Result<BindGroupLayoutHandle> {
        let slots = vec![
            BindingSlot {
                binding: texture_binding,
                kind: SlotKind::Texture,
                visibility: texture_visibility,
            },
            BindingSlot {
                binding: sampler_binding,
                kind: SlotKind::Sampler,
                visibility: sampler_visibility,
            },
        ];
        self.insert_layout(device, slots, None)
    }

    /// Binds `offset..offset + size` of `buffer`; `size` 0 binds the rest.
    pub fn create_uniform_bind_group(
        &mut self,
        device: DeviceHandle,
        layout: BindGroupLayoutHandle,
        binding: u32,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<BindGroupHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let layout_rec = get(&self.reg.bind_group_layouts, layout, "bind group layout")?;
        let buf = &get(&self.reg.buffers, buffer, "buffer")?.buffer;
        match_layout(&layout_rec.slots, &[(binding, SlotKind::UniformBuffer)])?;

        let group = dev.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout_rec.layout,
            entries: &[wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: buf,
                    offset,
                    size: NonZeroU64::new(size),
                }),
            }],
        });
        let handle = self.reg.bind_groups.insert(group);
        log::trace!("created bind group {handle:?}");
        Ok(handle)
    }

    pub fn create_texture_sampler_bind_group(
        &mut self,
        device: DeviceHandle,
        layout: BindGroupLayoutHandle,
        texture_binding: u32,
        view: TextureViewHandle,
        sampler_binding: u32,
        sampler: SamplerHandle,
    ) -> Result<BindGroupHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let layout_rec = get(&self.reg.bind_group_layouts, layout, "bind group layout")?;
        let view = &get(&self.reg.texture_views, view, "texture view")?.view;
        let sampler = get(&self.reg.samplers, sampler, "sampler")?;
        match_layout(
            &layout_rec.slots,
            &[
                (texture_binding, SlotKind::Texture),
                (sampler_binding, SlotKind::Sampler),
            ],
        )?;

        let group = dev.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout_rec.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: texture_binding,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: sampler_binding,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        let handle = self.reg.bind_groups.insert(group);
        log::trace!("created bind group {handle:?}");
        Ok(handle)
    }

    /// Pipeline layout over `layouts`; position `i` is bind group index `i`.
    pub fn create_pipeline_layout(
        &mut self,
        device: DeviceHandle,
        layouts: &[BindGroupLayoutHandle],
    ) -> Result<PipelineLayoutHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let bind_group_layouts = layouts
            .iter()
            .map(|&h| get(&self.reg.bind_group_layouts, h, "bind group layout").map(|r| &r.layout))
            .collect::<Result<Vec<_>>>()?;

        let layout = dev.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });
        let handle = self.reg.pipeline_layouts.insert(layout);
        log::trace!("created pipeline layout {handle:?} ({} groups)", layouts.len());
        Ok(handle)
    }
}
