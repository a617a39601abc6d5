//! Exercises the layer against a real adapter without a surface.
//!
//! Machines without one run the same tests on wgpu's no-op backend.

use std::time::Duration;

use ember_gpu::codes;
use ember_gpu::{
    Acquired, FlatAttribute, FlatBlend, FrameState, Gpu, GpuError, GpuInit, PipelineConfig,
    SurfaceHandle, TextureViewHandle, gen_checkerboard, wgpu,
};

const FLAT_SHADER: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(i) - 1);
    let y = f32(i32(i & 1u) * 2 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.0, 1.0);
}
"#;

const MESH_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

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
    return vec4<f32>(in.uv, 0.0, 1.0);
}
"#;

const FLOAT32X2: u32 = 0x1D;
const FLOAT32X3: u32 = 0x1E;
const STRIDE: u64 = 20;

#[rustfmt::skip]
const QUAD: [f32; 20] = [
    -0.5, -0.5, 0.0,  0.0, 1.0,
     0.5, -0.5, 0.0,  1.0, 1.0,
     0.5,  0.5, 0.0,  1.0, 0.0,
    -0.5,  0.5, 0.0,  0.0, 0.0,
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

#[rustfmt::skip]
const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

fn headless() -> (Gpu, Acquired) {
    let mut gpu = Gpu::new(GpuInit {
        request_timeout: Some(Duration::from_secs(30)),
        ..GpuInit::default()
    });
    let instance = gpu.create_instance();
    match gpu.acquire_device(instance, SurfaceHandle::default()) {
        Ok(acquired) => (gpu, acquired),
        Err(err) => {
            eprintln!("no adapter ({err}); using the no-op backend");
            let mut gpu = Gpu::new(GpuInit::noop());
            let instance = gpu.create_instance();
            let acquired = gpu
                .acquire_device(instance, SurfaceHandle::default())
                .expect("noop device");
            (gpu, acquired)
        }
    }
}

fn pos_uv() -> [FlatAttribute; 2] {
    [
        FlatAttribute::new(FLOAT32X3, 0, 0),
        FlatAttribute::new(FLOAT32X2, 12, 1),
    ]
}

// ── resource factory ──────────────────────────────────────────────────────

#[test]
fn mapped_writes_are_bounds_checked() {
    let (mut gpu, acq) = headless();
    let usage = codes::buffer_usages(0x20 | 0x08); // VERTEX | COPY_DST

    let buffer = gpu.create_buffer(acq.device, 16, usage, true).unwrap();
    let range = gpu.get_mapped_range(buffer, 0, 0).unwrap();
    assert_eq!(range.size, 16);

    for i in 0..4 {
        gpu.mapped_write_f32(range, i, i as f32).unwrap();
    }
    assert!(matches!(
        gpu.mapped_write_f32(range, 4, 0.0),
        Err(GpuError::MappedRangeOutOfBounds { .. })
    ));
    gpu.mapped_write_u16(range, 7, 3).unwrap();
    assert!(gpu.get_mapped_range(buffer, 8, 16).is_err());

    gpu.unmap(buffer).unwrap();
    assert!(matches!(
        gpu.mapped_write_u32(range, 0, 1),
        Err(GpuError::BufferNotMapped)
    ));
    assert!(gpu.take_diagnostics().is_empty());
}

#[test]
fn both_upload_paths_accept_the_same_bytes() {
    let (mut gpu, acq) = headless();
    let usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST;
    let bytes: &[u8] = bytemuck::cast_slice(&QUAD);

    let mapped = gpu.create_buffer(acq.device, bytes.len() as u64, usage, true).unwrap();
    gpu.buffer_write_floats(mapped, &QUAD).unwrap();

    let queued = gpu.create_buffer(acq.device, bytes.len() as u64, usage, false).unwrap();
    gpu.queue_write_buffer(acq.queue, queued, 0, bytes).unwrap();

    assert!(matches!(
        gpu.get_mapped_range(queued, 0, 0),
        Err(GpuError::BufferNotMapped)
    ));
    assert!(gpu.take_diagnostics().is_empty());
}

#[test]
fn texture_upload_checks_data_length() {
    let (mut gpu, acq) = headless();
    let texture = gpu
        .create_texture(
            acq.device,
            16,
            16,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            1,
        )
        .unwrap();

    let pixels = gen_checkerboard(16, [255, 0, 0], [0, 0, 255]);
    gpu.queue_write_texture(acq.queue, texture, &pixels, 64, 16, 16).unwrap();
    assert!(matches!(
        gpu.queue_write_texture(acq.queue, texture, &pixels[..100], 64, 16, 16),
        Err(GpuError::TextureDataTooShort { .. })
    ));

    let view = gpu.create_texture_view(texture).unwrap();
    let sampler = gpu
        .create_sampler(
            acq.device,
            codes::address_mode(0x02).unwrap(),
            codes::filter_mode(0x02).unwrap(),
            codes::filter_mode(0x01).unwrap(),
        )
        .unwrap();
    let stages = wgpu::ShaderStages::FRAGMENT;
    let layout = gpu
        .create_texture_sampler_bind_group_layout(acq.device, 0, stages, 1, stages)
        .unwrap();
    gpu.create_texture_sampler_bind_group(acq.device, layout, 0, view, 1, sampler)
        .unwrap();
    assert!(matches!(
        gpu.create_texture_sampler_bind_group(acq.device, layout, 1, view, 0, sampler),
        Err(GpuError::LayoutMismatch(_))
    ));
    assert!(gpu.take_diagnostics().is_empty());
}

// ── pipelines ─────────────────────────────────────────────────────────────

#[test]
fn every_pipeline_variant_builds() {
    let (mut gpu, acq) = headless();
    let device = acq.device;

    let flat = gpu.create_shader(device, FLAT_SHADER).unwrap();
    let mesh = gpu.create_shader(device, MESH_SHADER).unwrap();

    let ubo_layout = gpu
        .create_uniform_bind_group_layout(device, 0, wgpu::ShaderStages::VERTEX, 64)
        .unwrap();
    let layout = gpu.create_pipeline_layout(device, &[ubo_layout]).unwrap();

    let attrs = pos_uv();
    let mut three = attrs.to_vec();
    three.push(FlatAttribute::new(FLOAT32X2, 20, 2));
    let blend = FlatBlend {
        color_src: 0x05,
        color_dst: 0x06,
        color_op: 0x01,
        alpha_src: 0x02,
        alpha_dst: 0x06,
        alpha_op: 0x01,
    };

    gpu.create_render_pipeline_basic(device, flat, "vs_main", "fs_main")
        .unwrap();
    gpu.create_render_pipeline_vb(
        device,
        mesh,
        "vs_main",
        "fs_main",
        &[STRIDE],
        &[2],
        &[FLOAT32X3, FLOAT32X2],
        &[0, 12],
        &[0, 1],
    )
    .unwrap();
    gpu.create_render_pipeline_1vb(device, mesh, "vs_main", "fs_main", STRIDE, &attrs)
        .unwrap();
    gpu.create_render_pipeline_ext(
        device, mesh, "vs_main", "fs_main", layout, STRIDE, &attrs, true, 3,
    )
    .unwrap();
    gpu.create_render_pipeline_ext2(
        device,
        mesh,
        "vs_main",
        "fs_main",
        layout,
        28,
        &three,
        false,
        0,
        Some(blend),
    )
    .unwrap();

    let config = PipelineConfig::new(flat, "vs_main", "fs_main")
        .with_color_format(wgpu::TextureFormat::Rgba8Unorm)
        .with_topology(wgpu::PrimitiveTopology::TriangleStrip);
    gpu.create_render_pipeline(device, &config).unwrap();

    assert!(gpu.take_diagnostics().is_empty());
}

// ── off-screen frame ──────────────────────────────────────────────────────

#[test]
fn off_screen_frame_records_and_submits() {
    let (mut gpu, acq) = headless();
    let (device, queue) = (acq.device, acq.queue);
    let (w, h) = (64, 64);

    let target = gpu
        .create_texture(
            device,
            w,
            h,
            gpu.presentation_format(),
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            1,
        )
        .unwrap();
    let target_view = gpu.create_texture_view(target).unwrap();
    let depth = gpu.create_depth_texture(device, w, h).unwrap();
    let depth_view = gpu.create_texture_view(depth).unwrap();

    let vertices = gpu
        .create_buffer(device, 80, wgpu::BufferUsages::VERTEX, true)
        .unwrap();
    gpu.buffer_write_floats(vertices, &QUAD).unwrap();

    let indices = gpu
        .create_buffer(device, 12, wgpu::BufferUsages::INDEX, true)
        .unwrap();
    let range = gpu.get_mapped_range(indices, 0, 12).unwrap();
    for (i, &index) in QUAD_INDICES.iter().enumerate() {
        gpu.mapped_write_u16(range, i as u64, index).unwrap();
    }
    gpu.unmap(indices).unwrap();

    let ubo = gpu
        .create_buffer(
            device,
            64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            false,
        )
        .unwrap();
    gpu.queue_write_buffer(queue, ubo, 0, bytemuck::cast_slice(&IDENTITY))
        .unwrap();

    let ubo_layout = gpu
        .create_uniform_bind_group_layout(device, 0, wgpu::ShaderStages::VERTEX, 64)
        .unwrap();
    let ubo_group = gpu
        .create_uniform_bind_group(device, ubo_layout, 0, ubo, 0, 0)
        .unwrap();
    let layout = gpu.create_pipeline_layout(device, &[ubo_layout]).unwrap();
    let shader = gpu.create_shader(device, MESH_SHADER).unwrap();
    let pipeline = gpu
        .create_render_pipeline_ext(
            device, shader, "vs_main", "fs_main", layout, STRIDE, &pos_uv(), true, 3,
        )
        .unwrap();

    let encoder = gpu.create_command_encoder(device).unwrap();
    let pass = gpu
        .begin_render_pass_depth(encoder, target_view, wgpu::Color::BLACK, depth_view)
        .unwrap();
    assert!(matches!(
        gpu.begin_render_pass(encoder, target_view, wgpu::Color::BLACK),
        Err(GpuError::PassStillOpen)
    ));
    assert!(matches!(gpu.finish_encoder(encoder), Err(GpuError::PassStillOpen)));

    gpu.set_pipeline(pass, pipeline).unwrap();
    gpu.set_bind_group(pass, 0, ubo_group).unwrap();
    gpu.set_vertex_buffer(pass, 0, vertices, 0, 0).unwrap();
    gpu.set_index_buffer(pass, indices, codes::index_format(1).unwrap(), 0, 0)
        .unwrap();
    gpu.set_viewport(pass, 0.0, 0.0, w as f32, h as f32, 0.0, 1.0).unwrap();
    gpu.set_scissor_rect(pass, 0, 0, w, h).unwrap();
    gpu.draw_indexed(pass, 6, 1, 0, 0, 0).unwrap();
    gpu.end_render_pass(pass).unwrap();
    assert!(gpu.end_render_pass(pass).is_err());

    let commands = gpu.finish_encoder(encoder).unwrap();
    gpu.submit(queue, commands).unwrap();
    assert!(matches!(
        gpu.submit(queue, commands),
        Err(GpuError::InvalidHandle { .. })
    ));

    // Off-screen work never touches the frame protocol.
    assert_eq!(gpu.frame_state(), FrameState::Idle);
    assert_eq!(gpu.frame_stats().draws, 0);
    assert!(gpu.take_diagnostics().is_empty());
}

#[test]
fn out_of_range_binds_and_draws_are_errors() {
    let (mut gpu, acq) = headless();
    let device = acq.device;
    let target = gpu
        .create_texture(
            device,
            16,
            16,
            gpu.presentation_format(),
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            1,
        )
        .unwrap();
    let target_view = gpu.create_texture_view(target).unwrap();
    let vertices = gpu
        .create_buffer(device, 80, wgpu::BufferUsages::VERTEX, true)
        .unwrap();
    gpu.buffer_write_floats(vertices, &QUAD).unwrap();
    let indices = gpu
        .create_buffer(device, 12, wgpu::BufferUsages::INDEX, false)
        .unwrap();
    let uint16 = codes::index_format(1).unwrap();

    let encoder = gpu.create_command_encoder(device).unwrap();
    let pass = gpu
        .begin_render_pass(encoder, target_view, wgpu::Color::BLACK)
        .unwrap();

    // Empty rest of buffer, then an offset past the end.
    assert!(matches!(
        gpu.set_vertex_buffer(pass, 0, vertices, 80, 0),
        Err(GpuError::BufferRangeOutOfBounds { offset: 80, size: 0, len: 80 })
    ));
    assert!(gpu.set_vertex_buffer(pass, 0, vertices, 96, 0).is_err());
    assert!(gpu.set_vertex_buffer(pass, 0, vertices, 40, 64).is_err());
    assert!(gpu.set_vertex_buffer(pass, 0, vertices, u64::MAX, 8).is_err());
    assert!(gpu.set_index_buffer(pass, indices, uint16, 12, 0).is_err());
    assert!(gpu.set_index_buffer(pass, indices, uint16, 0, 16).is_err());

    gpu.set_vertex_buffer(pass, 0, vertices, 20, 0).unwrap();
    gpu.set_index_buffer(pass, indices, uint16, 0, 12).unwrap();
    assert!(matches!(
        gpu.draw_indexed(pass, 6, 1, u32::MAX - 2, 0, 0),
        Err(GpuError::DrawRangeOverflow { count: 6, .. })
    ));
    assert!(matches!(
        gpu.draw_indexed(pass, 6, 2, 0, 0, u32::MAX),
        Err(GpuError::DrawRangeOverflow { first: u32::MAX, count: 2 })
    ));

    // Rejected calls leave the pass usable.
    gpu.end_render_pass(pass).unwrap();
    let commands = gpu.finish_encoder(encoder).unwrap();
    gpu.submit(acq.queue, commands).unwrap();
}

#[test]
fn mapped_writes_at_the_address_limit_fail_cleanly() {
    let (mut gpu, acq) = headless();
    let buffer = gpu
        .create_buffer(acq.device, 16, wgpu::BufferUsages::VERTEX, true)
        .unwrap();
    assert!(matches!(
        gpu.write_mapped(buffer, u64::MAX - 1, &[0; 4]),
        Err(GpuError::MappedRangeOutOfBounds { len: 16, .. })
    ));
    assert!(gpu.write_mapped(buffer, u64::MAX, &[]).is_err());
    gpu.unmap(buffer).unwrap();
}

#[test]
fn frame_calls_without_a_surface_fail_cleanly() {
    let (mut gpu, acq) = headless();
    assert!(matches!(
        gpu.acquire_frame_view(SurfaceHandle::default()),
        Err(GpuError::InvalidHandle { kind: "surface" })
    ));
    assert!(gpu.present(SurfaceHandle::default()).is_err());

    let outcome = gpu.render_frame(
        SurfaceHandle::default(),
        acq.device,
        acq.queue,
        wgpu::Color::BLACK,
        TextureViewHandle::default(),
        |_, _| Ok(()),
    );
    assert!(outcome.is_err());
    assert_eq!(gpu.frame_state(), FrameState::Idle);
}

#[test]
fn released_handles_are_rejected() {
    let (mut gpu, acq) = headless();
    let buffer = gpu
        .create_buffer(acq.device, 16, wgpu::BufferUsages::UNIFORM, false)
        .unwrap();
    gpu.release_buffer(buffer);
    gpu.release_buffer(buffer);
    assert!(matches!(
        gpu.queue_write_buffer(acq.queue, buffer, 0, &[0; 16]),
        Err(GpuError::InvalidHandle { kind: "buffer" })
    ));

    let encoder = gpu.create_command_encoder(acq.device).unwrap();
    gpu.release_command_encoder(encoder);
    assert!(gpu.finish_encoder(encoder).is_err());
}
