//! Textured spinning cube built entirely through GPU handles.

use std::path::Path;

use anyhow::{Context, Result};
use ember_gpu::codes;
use ember_gpu::{
    BindGroupHandle, BufferHandle, DeviceHandle, FlatAttribute, Gpu, PipelineHandle, QueueHandle,
    RenderPassHandle, gen_checkerboard, wgpu,
};
use glam::{Mat4, Vec3};

const SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(1) @binding(0) var tex: texture_2d<f32>;
@group(1) @binding(1) var samp: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.pos = u.mvp * vec4<f32>(pos, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(tex, samp, in.uv);
}
"#;

/// position (3) + uv (2)
const FLOATS_PER_VERTEX: usize = 5;
const STRIDE: u64 = (FLOATS_PER_VERTEX * 4) as u64;
const CHECKER_SIZE: u32 = 256;

// WebGPU C header codes, as a scripting layer would pass them.
const FLOAT32X2: u32 = 0x1D;
const FLOAT32X3: u32 = 0x1E;
const CULL_BACK: u32 = 3;
const INDEX_UINT16: u32 = 1;

/// Resources that live for the whole run.
pub struct Scene {
    pipeline: PipelineHandle,
    vertices: BufferHandle,
    indices: BufferHandle,
    index_count: u32,
    uniforms: BufferHandle,
    uniform_group: BindGroupHandle,
    texture_group: BindGroupHandle,
}

impl Scene {
    pub fn new(gpu: &mut Gpu, device: DeviceHandle, queue: QueueHandle, image: Option<&Path>) -> Result<Self> {
        let (vertex_data, index_data) = cube();

        let vertices = gpu.create_buffer(
            device,
            (vertex_data.len() * 4) as u64,
            wgpu::BufferUsages::VERTEX,
            true,
        )?;
        gpu.buffer_write_floats(vertices, &vertex_data)?;

        let indices = gpu.create_buffer(
            device,
            (index_data.len() * 2) as u64,
            wgpu::BufferUsages::INDEX,
            true,
        )?;
        let range = gpu.get_mapped_range(indices, 0, 0)?;
        for (i, &index) in index_data.iter().enumerate() {
            gpu.mapped_write_u16(range, i as u64, index)?;
        }
        gpu.unmap(indices)?;

        let uniforms = gpu.create_buffer(
            device,
            64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            false,
        )?;

        let (width, height, pixels) = load_pixels(image);
        let texture = gpu.create_texture(
            device,
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            1,
        )?;
        gpu.queue_write_texture(queue, texture, &pixels, width * 4, width, height)?;
        let texture_view = gpu.create_texture_view(texture)?;
        let sampler = gpu.create_sampler(
            device,
            wgpu::AddressMode::Repeat,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
        )?;
        // The view keeps the texture alive.
        gpu.release_texture(texture);

        let uniform_layout =
            gpu.create_uniform_bind_group_layout(device, 0, wgpu::ShaderStages::VERTEX, 64)?;
        let texture_layout = gpu.create_texture_sampler_bind_group_layout(
            device,
            0,
            wgpu::ShaderStages::FRAGMENT,
            1,
            wgpu::ShaderStages::FRAGMENT,
        )?;
        let uniform_group = gpu.create_uniform_bind_group(device, uniform_layout, 0, uniforms, 0, 0)?;
        let texture_group = gpu.create_texture_sampler_bind_group(
            device,
            texture_layout,
            0,
            texture_view,
            1,
            sampler,
        )?;
        let layout = gpu.create_pipeline_layout(device, &[uniform_layout, texture_layout])?;

        let shader = gpu.create_shader(device, SHADER)?;
        let pipeline = gpu
            .create_render_pipeline_ext(
                device,
                shader,
                "vs_main",
                "fs_main",
                layout,
                STRIDE,
                &[
                    FlatAttribute::new(FLOAT32X3, 0, 0),
                    FlatAttribute::new(FLOAT32X2, 12, 1),
                ],
                true,
                CULL_BACK,
            )
            .context("failed to build cube pipeline")?;

        // Built objects hold what they need.
        gpu.release_shader(shader);
        gpu.release_pipeline_layout(layout);
        gpu.release_bind_group_layout(uniform_layout);
        gpu.release_bind_group_layout(texture_layout);
        gpu.release_texture_view(texture_view);
        gpu.release_sampler(sampler);

        Ok(Self {
            pipeline,
            vertices,
            indices,
            index_count: index_data.len() as u32,
            uniforms,
            uniform_group,
            texture_group,
        })
    }

    /// Uploads the model-view-projection matrix for time `t` (seconds).
    pub fn update(&self, gpu: &Gpu, queue: QueueHandle, t: f32, aspect: f32) -> Result<()> {
        let proj = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.5, 4.0), Vec3::ZERO, Vec3::Y);
        let model = Mat4::from_rotation_y(t) * Mat4::from_rotation_x(t * 0.5);
        let mvp = proj * view * model;
        gpu.queue_write_buffer(queue, self.uniforms, 0, bytemuck::bytes_of(&mvp))?;
        Ok(())
    }

    pub fn draw(&self, gpu: &mut Gpu, pass: RenderPassHandle) -> ember_gpu::Result<()> {
        gpu.set_pipeline(pass, self.pipeline)?;
        gpu.set_bind_group(pass, 0, self.uniform_group)?;
        gpu.set_bind_group(pass, 1, self.texture_group)?;
        gpu.set_vertex_buffer(pass, 0, self.vertices, 0, 0)?;
        gpu.set_index_buffer(pass, self.indices, codes::index_format(INDEX_UINT16)?, 0, 0)?;
        gpu.draw_indexed(pass, self.index_count, 1, 0, 0, 0)
    }

    pub fn release(self, gpu: &mut Gpu) {
        gpu.release_pipeline(self.pipeline);
        gpu.release_bind_group(self.uniform_group);
        gpu.release_bind_group(self.texture_group);
        gpu.release_buffer(self.vertices);
        gpu.release_buffer(self.indices);
        gpu.release_buffer(self.uniforms);
    }
}

/// Decoded RGBA8 pixels of `path`, or the procedural checkerboard.
fn load_pixels(path: Option<&Path>) -> (u32, u32, Vec<u8>) {
    if let Some(path) = path {
        match image::open(path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (w, h) = rgba.dimensions();
                log::info!("texture: {} ({w}x{h})", path.display());
                return (w, h, rgba.into_raw());
            }
            Err(err) => log::warn!("could not load {}: {err}; using checkerboard", path.display()),
        }
    }
    let pixels = gen_checkerboard(CHECKER_SIZE, [230, 120, 40], [30, 30, 45]);
    (CHECKER_SIZE, CHECKER_SIZE, pixels)
}

/// Unit cube with per-face UVs: 24 vertices, 36 indices.
fn cube() -> (Vec<f32>, Vec<u16>) {
    // Outward normal, then the face's right and up axes.
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let corners = [(-1.0, -1.0, 0.0, 1.0), (1.0, -1.0, 1.0, 1.0), (1.0, 1.0, 1.0, 0.0), (-1.0, 1.0, 0.0, 0.0)];

    let mut vertices = Vec::with_capacity(24 * FLOATS_PER_VERTEX);
    let mut indices = Vec::with_capacity(36);
    for (face, (normal, right, up)) in faces.iter().enumerate() {
        for &(x, y, u, v) in &corners {
            let p = (*normal + *right * x + *up * y) * 0.5;
            vertices.extend_from_slice(&[p.x, p.y, p.z, u, v]);
        }
        let base = (face * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}
