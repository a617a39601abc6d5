//! Explicit release, one call per handle category.
//!
//! Releasing a null, already released or stale handle does nothing.

use std::fmt::Debug;

use slotmap::{Key, SlotMap};

use crate::device::Gpu;
use crate::registry::{
    AdapterHandle, BindGroupHandle, BindGroupLayoutHandle, BufferHandle, CommandBufferHandle,
    CommandEncoderHandle, DeviceHandle, InstanceHandle, PipelineHandle, PipelineLayoutHandle,
    QueueHandle, RenderPassHandle, SamplerHandle, ShaderHandle, SurfaceHandle, TextureHandle,
    TextureViewHandle,
};

fn release<K: Key + Debug, V>(map: &mut SlotMap<K, V>, handle: K, kind: &str) -> bool {
    let released = map.remove(handle).is_some();
    if released {
        log::trace!("released {kind} {handle:?}");
    }
    released
}

impl Gpu {
    pub fn release_instance(&mut self, instance: InstanceHandle) {
        release(&mut self.reg.instances, instance, "instance");
    }

    /// Drops any unpresented frame texture along with the surface.
    pub fn release_surface(&mut self, surface: SurfaceHandle) {
        self.abandon_frame_of(surface);
        release(&mut self.reg.surfaces, surface, "surface");
    }

    pub fn release_adapter(&mut self, adapter: AdapterHandle) {
        release(&mut self.reg.adapters, adapter, "adapter");
    }

    /// Queues obtained from the device stay valid until released themselves.
    pub fn release_device(&mut self, device: DeviceHandle) {
        release(&mut self.reg.devices, device, "device");
    }

    pub fn release_queue(&mut self, queue: QueueHandle) {
        release(&mut self.reg.queues, queue, "queue");
    }

    pub fn release_shader(&mut self, shader: ShaderHandle) {
        release(&mut self.reg.shaders, shader, "shader");
    }

    pub fn release_bind_group_layout(&mut self, layout: BindGroupLayoutHandle) {
        release(&mut self.reg.bind_group_layouts, layout, "bind group layout");
    }

    pub fn release_pipeline_layout(&mut self, layout: PipelineLayoutHandle) {
        release(&mut self.reg.pipeline_layouts, layout, "pipeline layout");
    }

    pub fn release_pipeline(&mut self, pipeline: PipelineHandle) {
        release(&mut self.reg.pipelines, pipeline, "pipeline");
    }

    pub fn release_buffer(&mut self, buffer: BufferHandle) {
        release(&mut self.reg.buffers, buffer, "buffer");
    }

    pub fn release_texture(&mut self, texture: TextureHandle) {
        release(&mut self.reg.textures, texture, "texture");
    }

    /// Frame views are released by [`present`](Gpu::present); releasing one
    /// earlier abandons the frame.
    pub fn release_texture_view(&mut self, view: TextureViewHandle) {
        if self.frame.view == Some(view) {
            self.abandon_frame();
            return;
        }
        release(&mut self.reg.texture_views, view, "texture view");
    }

    pub fn release_sampler(&mut self, sampler: SamplerHandle) {
        release(&mut self.reg.samplers, sampler, "sampler");
    }

    pub fn release_bind_group(&mut self, group: BindGroupHandle) {
        release(&mut self.reg.bind_groups, group, "bind group");
    }

    /// Releasing the frame's encoder abandons the frame.
    pub fn release_command_encoder(&mut self, encoder: CommandEncoderHandle) {
        if self.frame.owns_encoder(encoder) {
            self.abandon_frame();
            return;
        }
        let open_pass = self.reg.encoders.get(encoder).and_then(|r| r.open_pass);
        if let Some(pass) = open_pass {
            release(&mut self.reg.passes, pass, "render pass");
        }
        release(&mut self.reg.encoders, encoder, "command encoder");
    }

    /// An open pass is ended first.
    pub fn release_render_pass(&mut self, pass: RenderPassHandle) {
        if !self.reg.passes.contains_key(pass) {
            return;
        }
        if let Err(err) = self.end_render_pass(pass) {
            log::warn!("releasing {pass:?}: {err}");
            release(&mut self.reg.passes, pass, "render pass");
        }
    }

    /// Releasing the frame's unsubmitted command buffer abandons the frame.
    pub fn release_command_buffer(&mut self, commands: CommandBufferHandle) {
        if self.frame.owns_commands(commands) {
            self.abandon_frame();
            return;
        }
        release(&mut self.reg.command_buffers, commands, "command buffer");
    }
}
