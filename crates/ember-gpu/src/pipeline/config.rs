use crate::error::{GpuError, Result};
use crate::registry::{PipelineLayoutHandle, ShaderHandle};
use crate::resource::DEPTH_FORMAT;

/// Vertex buffers a single pipeline may declare.
pub const MAX_VERTEX_BUFFERS: usize = 8;
/// Vertex attributes across all buffers of a pipeline.
pub const MAX_VERTEX_ATTRIBUTES: usize = 32;

/// Owned form of [`wgpu::VertexBufferLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBufferDesc {
    pub array_stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexBufferDesc {
    /// Per-vertex buffer.
    pub fn new(array_stride: u64, attributes: Vec<wgpu::VertexAttribute>) -> Self {
        Self {
            array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Depth test used by depth-enabled pipelines: write on, `Less`, 24-bit depth.
pub fn depth24_less() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Everything needed to build a render pipeline.
///
/// [`PipelineConfig::new`] yields the fixed defaults every pipeline starts
/// from: triangle list, counter-clockwise front face, no culling, no vertex
/// buffers, no depth, no blending, inferred layout, and the presentation
/// format as the single color target. Builder methods override one aspect each.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub shader: ShaderHandle,
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// `None` lets wgpu derive the layout from the shader.
    pub layout: Option<PipelineLayoutHandle>,
    pub vertex_buffers: Vec<VertexBufferDesc>,
    pub topology: wgpu::PrimitiveTopology,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub blend: Option<wgpu::BlendState>,
    /// `None` targets [`Gpu::presentation_format`](crate::Gpu::presentation_format).
    pub color_format: Option<wgpu::TextureFormat>,
}

impl PipelineConfig {
    pub fn new(shader: ShaderHandle, vertex_entry: &str, fragment_entry: &str) -> Self {
        Self {
            shader,
            vertex_entry: vertex_entry.to_owned(),
            fragment_entry: fragment_entry.to_owned(),
            layout: None,
            vertex_buffers: Vec::new(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            depth_stencil: None,
            blend: None,
            color_format: None,
        }
    }

    pub fn with_layout(mut self, layout: PipelineLayoutHandle) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_vertex_buffer(mut self, buffer: VertexBufferDesc) -> Self {
        self.vertex_buffers.push(buffer);
        self
    }

    pub fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_front_face(mut self, front_face: wgpu::FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_depth_stencil(mut self, depth: wgpu::DepthStencilState) -> Self {
        self.depth_stencil = Some(depth);
        self
    }

    pub fn with_blend(mut self, blend: wgpu::BlendState) -> Self {
        self.blend = Some(blend);
        self
    }

    pub fn with_color_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    /// Rejects vertex layouts beyond [`MAX_VERTEX_BUFFERS`] / [`MAX_VERTEX_ATTRIBUTES`].
    pub fn validate(&self) -> Result<()> {
        if self.vertex_buffers.len() > MAX_VERTEX_BUFFERS {
            return Err(GpuError::PipelineShape(format!(
                "{} vertex buffers exceed the limit of {MAX_VERTEX_BUFFERS}",
                self.vertex_buffers.len()
            )));
        }
        let attributes: usize = self.vertex_buffers.iter().map(|b| b.attributes.len()).sum();
        if attributes > MAX_VERTEX_ATTRIBUTES {
            return Err(GpuError::PipelineShape(format!(
                "{attributes} vertex attributes exceed the limit of {MAX_VERTEX_ATTRIBUTES}"
            )));
        }
        Ok(())
    }

    // ── lowering ─────────────────────────────────────────────────────────

    pub(crate) fn primitive_state(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: self.topology,
            front_face: self.front_face,
            cull_mode: self.cull_mode,
            ..Default::default()
        }
    }

    /// No multisampling.
    pub(crate) fn multisample_state(&self) -> wgpu::MultisampleState {
        wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }

    pub(crate) fn color_target(&self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.blend,
            write_mask: wgpu::ColorWrites::ALL,
        }
    }

    pub(crate) fn vertex_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.vertex_buffers
            .iter()
            .map(|b| wgpu::VertexBufferLayout {
                array_stride: b.array_stride,
                step_mode: b.step_mode,
                attributes: &b.attributes,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use slotmap::SlotMap;

    fn shader() -> ShaderHandle {
        let mut map: SlotMap<ShaderHandle, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn attr(location: u32) -> wgpu::VertexAttribute {
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: 16 * location as u64,
            shader_location: location,
        }
    }

    #[test]
    fn defaults_match_the_fixed_pipeline_shape() {
        let c = PipelineConfig::new(shader(), "vs_main", "fs_main");
        let p = c.primitive_state();
        assert_eq!(p.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(p.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(p.cull_mode, None);
        assert_eq!(p.polygon_mode, wgpu::PolygonMode::Fill);

        let m = c.multisample_state();
        assert_eq!((m.count, m.mask), (1, u64::MAX));

        let t = c.color_target(wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(t.write_mask, wgpu::ColorWrites::ALL);
        assert_eq!(t.blend, None);
        assert!(c.depth_stencil.is_none());
        assert!(c.vertex_layouts().is_empty());
    }

    #[test]
    fn vertex_layouts_preserve_order() {
        let c = PipelineConfig::new(shader(), "vs", "fs")
            .with_vertex_buffer(VertexBufferDesc::new(32, vec![attr(0), attr(1)]))
            .with_vertex_buffer(VertexBufferDesc::new(16, vec![attr(2)]));
        let layouts = c.vertex_layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].array_stride, 32);
        assert_eq!(layouts[0].attributes, &[attr(0), attr(1)]);
        assert_eq!(layouts[1].attributes[0].shader_location, 2);
    }

    #[test]
    fn depth_helper_is_depth24_less_with_writes() {
        let d = depth24_less();
        assert_eq!(d.format, wgpu::TextureFormat::Depth24Plus);
        assert!(d.depth_write_enabled);
        assert_eq!(d.depth_compare, wgpu::CompareFunction::Less);
    }

    #[test]
    fn too_many_buffers_or_attributes_fail_validation() {
        let mut c = PipelineConfig::new(shader(), "vs", "fs");
        for _ in 0..MAX_VERTEX_BUFFERS {
            c = c.with_vertex_buffer(VertexBufferDesc::new(4, vec![attr(0); 4]));
        }
        c.validate().unwrap();

        let over_buffers = c.clone().with_vertex_buffer(VertexBufferDesc::new(4, vec![]));
        assert!(matches!(over_buffers.validate(), Err(GpuError::PipelineShape(_))));

        let mut over_attrs = c;
        over_attrs.vertex_buffers[0].attributes.push(attr(5));
        assert!(over_attrs.validate().is_err());
    }
}
