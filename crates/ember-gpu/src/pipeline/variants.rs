//! Flat-parameter pipeline shapes.
//!
//! Each shape takes primitive values and numeric codes (see [`crate::codes`])
//! and decodes them into a [`PipelineConfig`]. The shapes grow strictly: a
//! wider shape given only the parameters of a narrower one yields the same
//! config.

use slotmap::Key;

use super::config::{PipelineConfig, VertexBufferDesc, depth24_less};
use crate::codes;
use crate::device::Gpu;
use crate::error::{GpuError, Result};
use crate::registry::{DeviceHandle, PipelineHandle, PipelineLayoutHandle, ShaderHandle};

/// One vertex attribute: format code, byte offset, shader location.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FlatAttribute {
    pub format: u32,
    pub offset: u64,
    pub location: u32,
}

impl FlatAttribute {
    pub fn new(format: u32, offset: u64, location: u32) -> Self {
        Self {
            format,
            offset,
            location,
        }
    }

    fn decode(&self) -> Result<wgpu::VertexAttribute> {
        Ok(wgpu::VertexAttribute {
            format: codes::vertex_format(self.format)?,
            offset: self.offset,
            shader_location: self.location,
        })
    }
}

/// Blend factor and operation codes for the color and alpha channels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FlatBlend {
    pub color_src: u32,
    pub color_dst: u32,
    pub color_op: u32,
    pub alpha_src: u32,
    pub alpha_dst: u32,
    pub alpha_op: u32,
}

impl FlatBlend {
    fn decode(&self) -> Result<wgpu::BlendState> {
        Ok(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: codes::blend_factor(self.color_src)?,
                dst_factor: codes::blend_factor(self.color_dst)?,
                operation: codes::blend_operation(self.color_op)?,
            },
            alpha: wgpu::BlendComponent {
                src_factor: codes::blend_factor(self.alpha_src)?,
                dst_factor: codes::blend_factor(self.alpha_dst)?,
                operation: codes::blend_operation(self.alpha_op)?,
            },
        })
    }
}

fn single_buffer(stride: u64, attrs: &[FlatAttribute], max: usize) -> Result<VertexBufferDesc> {
    if attrs.len() > max {
        return Err(GpuError::PipelineShape(format!(
            "{} attributes given, this shape takes at most {max}",
            attrs.len()
        )));
    }
    let attributes = attrs
        .iter()
        .map(FlatAttribute::decode)
        .collect::<Result<Vec<_>>>()?;
    Ok(VertexBufferDesc::new(stride, attributes))
}

/// No vertex buffers; vertices come from the shader.
pub fn fullscreen(shader: ShaderHandle, vs_entry: &str, fs_entry: &str) -> PipelineConfig {
    PipelineConfig::new(shader, vs_entry, fs_entry)
}

/// `strides.len()` buffers; buffer `b` owns the next `attr_counts[b]` entries
/// of the parallel `formats`/`offsets`/`locations` arrays.
#[allow(clippy::too_many_arguments)]
pub fn vertex_buffers(
    shader: ShaderHandle,
    vs_entry: &str,
    fs_entry: &str,
    strides: &[u64],
    attr_counts: &[u32],
    formats: &[u32],
    offsets: &[u64],
    locations: &[u32],
) -> Result<PipelineConfig> {
    if strides.len() != attr_counts.len() {
        return Err(GpuError::PipelineShape(format!(
            "{} strides but {} attribute counts",
            strides.len(),
            attr_counts.len()
        )));
    }
    let total: usize = attr_counts.iter().map(|&n| n as usize).sum();
    if formats.len() != total || offsets.len() != total || locations.len() != total {
        return Err(GpuError::PipelineShape(format!(
            "attribute counts sum to {total}; got {} formats, {} offsets, {} locations",
            formats.len(),
            offsets.len(),
            locations.len()
        )));
    }

    let mut config = PipelineConfig::new(shader, vs_entry, fs_entry);
    let mut next = 0;
    for (&stride, &count) in strides.iter().zip(attr_counts) {
        let range = next..next + count as usize;
        next = range.end;
        let attributes = range
            .map(|i| FlatAttribute::new(formats[i], offsets[i], locations[i]).decode())
            .collect::<Result<Vec<_>>>()?;
        config = config.with_vertex_buffer(VertexBufferDesc::new(stride, attributes));
    }
    config.validate()?;
    Ok(config)
}

/// One vertex buffer with up to two attributes.
pub fn one_buffer(
    shader: ShaderHandle,
    vs_entry: &str,
    fs_entry: &str,
    stride: u64,
    attrs: &[FlatAttribute],
) -> Result<PipelineConfig> {
    Ok(PipelineConfig::new(shader, vs_entry, fs_entry)
        .with_vertex_buffer(single_buffer(stride, attrs, 2)?))
}

/// [`one_buffer`] plus an optional layout (null infers), optional depth test
/// and a cull mode code.
#[allow(clippy::too_many_arguments)]
pub fn extended(
    shader: ShaderHandle,
    vs_entry: &str,
    fs_entry: &str,
    layout: PipelineLayoutHandle,
    stride: u64,
    attrs: &[FlatAttribute],
    has_depth: bool,
    cull_mode: u32,
) -> Result<PipelineConfig> {
    extended_with(shader, vs_entry, fs_entry, layout, stride, attrs, 2, has_depth, cull_mode)
}

/// [`extended`] with up to three attributes and optional blending.
#[allow(clippy::too_many_arguments)]
pub fn extended_blend(
    shader: ShaderHandle,
    vs_entry: &str,
    fs_entry: &str,
    layout: PipelineLayoutHandle,
    stride: u64,
    attrs: &[FlatAttribute],
    has_depth: bool,
    cull_mode: u32,
    blend: Option<FlatBlend>,
) -> Result<PipelineConfig> {
    let config =
        extended_with(shader, vs_entry, fs_entry, layout, stride, attrs, 3, has_depth, cull_mode)?;
    Ok(match blend {
        Some(b) => config.with_blend(b.decode()?),
        None => config,
    })
}

#[allow(clippy::too_many_arguments)]
fn extended_with(
    shader: ShaderHandle,
    vs_entry: &str,
    fs_entry: &str,
    layout: PipelineLayoutHandle,
    stride: u64,
    attrs: &[FlatAttribute],
    max_attrs: usize,
    has_depth: bool,
    cull_mode: u32,
) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::new(shader, vs_entry, fs_entry)
        .with_vertex_buffer(single_buffer(stride, attrs, max_attrs)?)
        .with_cull_mode(codes::cull_mode(cull_mode)?);
    if !layout.is_null() {
        config = config.with_layout(layout);
    }
    if has_depth {
        config = config.with_depth_stencil(depth24_less());
    }
    Ok(config)
}

impl Gpu {
    /// Fullscreen or procedural pipeline without vertex buffers.
    pub fn create_render_pipeline_basic(
        &mut self,
        device: DeviceHandle,
        shader: ShaderHandle,
        vs_entry: &str,
        fs_entry: &str,
    ) -> Result<PipelineHandle> {
        self.create_render_pipeline(device, &fullscreen(shader, vs_entry, fs_entry))
    }

    /// See [`vertex_buffers`].
    #[allow(clippy::too_many_arguments)]
    pub fn create_render_pipeline_vb(
        &mut self,
        device: DeviceHandle,
        shader: ShaderHandle,
        vs_entry: &str,
        fs_entry: &str,
        strides: &[u64],
        attr_counts: &[u32],
        formats: &[u32],
        offsets: &[u64],
        locations: &[u32],
    ) -> Result<PipelineHandle> {
        let config = vertex_buffers(
            shader,
            vs_entry,
            fs_entry,
            strides,
            attr_counts,
            formats,
            offsets,
            locations,
        )?;
        self.create_render_pipeline(device, &config)
    }

    pub fn create_render_pipeline_1vb(
        &mut self,
        device: DeviceHandle,
        shader: ShaderHandle,
        vs_entry: &str,
        fs_entry: &str,
        stride: u64,
        attrs: &[FlatAttribute],
    ) -> Result<PipelineHandle> {
        let config = one_buffer(shader, vs_entry, fs_entry, stride, attrs)?;
        self.create_render_pipeline(device, &config)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_render_pipeline_ext(
        &mut self,
        device: DeviceHandle,
        shader: ShaderHandle,
        vs_entry: &str,
        fs_entry: &str,
        layout: PipelineLayoutHandle,
        stride: u64,
        attrs: &[FlatAttribute],
        has_depth: bool,
        cull_mode: u32,
    ) -> Result<PipelineHandle> {
        let config = extended(
            shader, vs_entry, fs_entry, layout, stride, attrs, has_depth, cull_mode,
        )?;
        self.create_render_pipeline(device, &config)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_render_pipeline_ext2(
        &mut self,
        device: DeviceHandle,
        shader: ShaderHandle,
        vs_entry: &str,
        fs_entry: &str,
        layout: PipelineLayoutHandle,
        stride: u64,
        attrs: &[FlatAttribute],
        has_depth: bool,
        cull_mode: u32,
        blend: Option<FlatBlend>,
    ) -> Result<PipelineHandle> {
        let config = extended_blend(
            shader, vs_entry, fs_entry, layout, stride, attrs, has_depth, cull_mode, blend,
        )?;
        self.create_render_pipeline(device, &config)
    }
}
