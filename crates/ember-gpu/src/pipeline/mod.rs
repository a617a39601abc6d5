//! Render pipeline construction.
//!
//! [`PipelineConfig`] is the general builder; [`variants`] layers the
//! flat-parameter shapes on top of it.

mod config;
pub mod variants;

pub use config::{
    MAX_VERTEX_ATTRIBUTES, MAX_VERTEX_BUFFERS, PipelineConfig, VertexBufferDesc, depth24_less,
};
pub use variants::{FlatAttribute, FlatBlend};

use crate::device::Gpu;
use crate::error::Result;
use crate::registry::{DeviceHandle, PipelineHandle, get};

impl Gpu {
    /// Builds a render pipeline from `config`.
    ///
    /// Shader or layout problems the native layer detects arrive as
    /// diagnostics; the returned handle is still valid to release.
    pub fn create_render_pipeline(
        &mut self,
        device: DeviceHandle,
        config: &PipelineConfig,
    ) -> Result<PipelineHandle> {
        config.validate()?;

        let dev = &get(&self.reg.devices, device, "device")?.device;
        let module = get(&self.reg.shaders, config.shader, "shader")?;
        let layout = match config.layout {
            Some(h) => Some(get(&self.reg.pipeline_layouts, h, "pipeline layout")?),
            None => None,
        };

        let format = config.color_format.unwrap_or(self.presentation_format);
        let buffers = config.vertex_layouts();
        let targets = [Some(config.color_target(format))];

        let pipeline = dev.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout,
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(config.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(config.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &targets,
            }),
            primitive: config.primitive_state(),
            depth_stencil: config.depth_stencil.clone(),
            multisample: config.multisample_state(),
            multiview_mask: None,
            cache: None,
        });

        let handle = self.reg.pipelines.insert(pipeline);
        log::trace!(
            "created pipeline {handle:?} ({} vertex buffers, {format:?})",
            config.vertex_buffers.len()
        );
        Ok(handle)
    }
}
