//! Spinning textured cube on top of `ember-gpu`.
//!
//! Usage: `ember-demo [IMAGE]`. Without an image (or when it fails to load) a
//! procedural checkerboard is used.

mod scene;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use ember_gpu::logging::{LoggingConfig, init_logging};
use ember_gpu::{
    DeviceHandle, FrameOutcome, Gpu, GpuInit, InstanceHandle, QueueHandle, SurfaceHandle,
    TextureHandle, TextureViewHandle, wgpu,
};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::scene::Scene;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

/// Depth attachment sized to the surface.
struct Depth {
    texture: TextureHandle,
    view: TextureViewHandle,
}

impl Depth {
    fn new(gpu: &mut Gpu, device: DeviceHandle, size: PhysicalSize<u32>) -> Result<Self> {
        let texture = gpu.create_depth_texture(device, size.width, size.height)?;
        let view = gpu.create_texture_view(texture)?;
        Ok(Self { texture, view })
    }

    fn release(self, gpu: &mut Gpu) {
        gpu.release_texture_view(self.view);
        gpu.release_texture(self.texture);
    }
}

/// Everything that exists once the window is up.
struct Session {
    window: Arc<Window>,
    gpu: Gpu,
    instance: InstanceHandle,
    surface: SurfaceHandle,
    device: DeviceHandle,
    queue: QueueHandle,
    depth: Option<Depth>,
    scene: Scene,
    started: Instant,
}

impl Session {
    fn new(event_loop: &ActiveEventLoop, gpu_init: GpuInit, image: Option<PathBuf>) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("ember")
            .with_inner_size(LogicalSize::new(960.0, 640.0));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let mut gpu = Gpu::new(gpu_init);
        let instance = gpu.create_instance();
        let surface = gpu.create_surface(instance, window.clone())?;
        let acquired = gpu
            .acquire_device(instance, surface)
            .context("failed to acquire a GPU device")?;

        let size = window.inner_size();
        gpu.configure_surface(surface, acquired.device, size.width, size.height)?;
        let depth = depth_for(&mut gpu, acquired.device, size)?;
        let scene = Scene::new(&mut gpu, acquired.device, acquired.queue, image.as_deref())?;

        // Adapter and device stay alive through the queue and resources.
        gpu.release_adapter(acquired.adapter);

        Ok(Self {
            window,
            gpu,
            instance,
            surface,
            device: acquired.device,
            queue: acquired.queue,
            depth,
            scene,
            started: Instant::now(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        self.gpu
            .configure_surface(self.surface, self.device, size.width, size.height)?;
        if let Some(old) = self.depth.take() {
            old.release(&mut self.gpu);
        }
        self.depth = depth_for(&mut self.gpu, self.device, size)?;
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(depth_view) = self.depth.as_ref().map(|d| d.view) else {
            // Minimized.
            return Ok(());
        };

        let size = self.window.inner_size();
        let aspect = size.width as f32 / size.height.max(1) as f32;
        let t = self.started.elapsed().as_secs_f32();
        self.scene.update(&self.gpu, self.queue, t, aspect)?;

        let scene = &self.scene;
        let outcome = self.gpu.render_frame(
            self.surface,
            self.device,
            self.queue,
            CLEAR,
            depth_view,
            |gpu, pass| scene.draw(gpu, pass),
        )?;
        if outcome == FrameOutcome::Skipped {
            log::debug!("frame skipped ({} in a row)", self.gpu.frame_stats().skipped);
        }

        // Already logged when reported.
        let reported = self.gpu.take_diagnostics().len();
        if reported > 0 {
            log::debug!("{reported} gpu diagnostics this frame");
        }
        Ok(())
    }

    fn shutdown(mut self) {
        if let Some(depth) = self.depth.take() {
            depth.release(&mut self.gpu);
        }
        self.scene.release(&mut self.gpu);
        self.gpu.release_surface(self.surface);
        self.gpu.release_queue(self.queue);
        self.gpu.release_device(self.device);
        self.gpu.release_instance(self.instance);
    }
}

/// No depth attachment while the window has no area.
fn depth_for(gpu: &mut Gpu, device: DeviceHandle, size: PhysicalSize<u32>) -> Result<Option<Depth>> {
    if size.width == 0 || size.height == 0 {
        return Ok(None);
    }
    Depth::new(gpu, device, size).map(Some)
}

struct Demo {
    gpu_init: GpuInit,
    image: Option<PathBuf>,
    session: Option<Session>,
}

impl Demo {
    fn fail(&mut self, event_loop: &ActiveEventLoop, what: &str, err: anyhow::Error) {
        log::error!("{what}: {err:#}");
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match Session::new(event_loop, self.gpu_init.clone(), self.image.take()) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, "failed to start", e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let result = match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(session) = self.session.take() {
                    session.shutdown();
                }
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => session.resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = session.window.inner_size();
                session.resize(size)
            }
            WindowEvent::RedrawRequested => session.redraw(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.fail(event_loop, "frame failed", e);
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let image = std::env::args_os().nth(1).map(PathBuf::from);
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut demo = Demo {
        gpu_init: GpuInit::default(),
        image,
        session: None,
    };

    event_loop
        .run_app(&mut demo)
        .context("winit event loop terminated with error")?;
    Ok(())
}
