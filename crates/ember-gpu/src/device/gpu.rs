use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use super::GpuInit;
use super::acquire::{self, Acquired, DeviceRequests, block_on_request};
use crate::error::{GpuError, Result};
use crate::frame::{FrameRecorder, FrameState, FrameStats};
use crate::logging::{DiagnosticSink, GpuDiagnostic};
use crate::registry::{
    AdapterHandle, AdapterRecord, DeviceHandle, DeviceRecord, InstanceHandle, QueueHandle,
    Registry, SurfaceHandle, SurfaceRecord, get, get_opt,
};

/// Handle-based front end over wgpu.
///
/// Every native object created through this type lives in its registry and is
/// addressed by a typed handle:
/// - device acquisition (instance, surface, adapter, device, queue)
/// - resource creation (buffers, textures, samplers, bind groups, pipelines)
/// - the per-frame recording protocol
/// - explicit release, one call per category
///
/// Intended for a single control thread; nothing here is shared.
pub struct Gpu {
    pub(crate) init: GpuInit,
    pub(crate) reg: Registry,
    pub(crate) frame: FrameRecorder,
    diagnostics: DiagnosticSink,
    /// Format of the most recently configured surface.
    pub(crate) presentation_format: wgpu::TextureFormat,
}

impl Default for Gpu {
    fn default() -> Self {
        Self::new(GpuInit::default())
    }
}

impl Gpu {
    pub fn new(init: GpuInit) -> Self {
        let presentation_format = init.preferred_format;
        Self {
            init,
            reg: Registry::default(),
            frame: FrameRecorder::default(),
            diagnostics: DiagnosticSink::new(),
            presentation_format,
        }
    }

    pub fn init(&self) -> &GpuInit {
        &self.init
    }

    /// Color format pipelines target unless they name one explicitly.
    pub fn presentation_format(&self) -> wgpu::TextureFormat {
        self.presentation_format
    }

    /// Shared sink receiving uncaptured errors from every device.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// Drains the GPU diagnostics reported since the last call.
    pub fn take_diagnostics(&self) -> Vec<GpuDiagnostic> {
        self.diagnostics.drain()
    }

    pub fn frame_state(&self) -> FrameState {
        self.frame.tracker.state()
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.frame.tracker.stats()
    }

    // ── acquisition ──────────────────────────────────────────────────────

    pub fn create_instance(&mut self) -> InstanceHandle {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: self.init.backends,
            backend_options: self.init.backend_options.clone(),
            ..Default::default()
        });
        let handle = self.reg.instances.insert(instance);
        log::trace!("created instance {handle:?}");
        handle
    }

    /// Creates a presentation surface for `window`.
    ///
    /// The surface keeps the window alive; pass an `Arc` of the window.
    pub fn create_surface<W>(&mut self, instance: InstanceHandle, window: W) -> Result<SurfaceHandle>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let surface = get(&self.reg.instances, instance, "instance")?.create_surface(window)?;
        let handle = self.reg.surfaces.insert(SurfaceRecord {
            surface,
            device: None,
            config: None,
            size: None,
            current: None,
        });
        log::trace!("created surface {handle:?}");
        Ok(handle)
    }

    /// Requests an adapter able to present to `surface`.
    ///
    /// A null `surface` requests a headless adapter.
    pub fn request_adapter(
        &mut self,
        instance: InstanceHandle,
        surface: SurfaceHandle,
    ) -> Result<AdapterHandle> {
        let inst = get(&self.reg.instances, instance, "instance")?;
        let compatible = get_opt(&self.reg.surfaces, surface, "surface")?.map(|s| &s.surface);

        let options = wgpu::RequestAdapterOptions {
            power_preference: self.init.power_preference,
            compatible_surface: compatible,
            force_fallback_adapter: self.init.force_fallback_adapter,
        };
        let adapter = block_on_request(
            inst.request_adapter(&options),
            self.init.request_timeout,
            || {
                let _ = inst.poll_all(false);
            },
            "adapter",
        )?
        .map_err(|e| GpuError::AdapterUnavailable(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let instance = inst.clone();
        let handle = self.reg.adapters.insert(AdapterRecord { adapter, instance });
        log::trace!("created adapter {handle:?}");
        Ok(handle)
    }

    /// Requests a device and installs the uncaptured-error handler on it.
    pub fn request_device(&mut self, adapter: AdapterHandle) -> Result<DeviceHandle> {
        let record = get(&self.reg.adapters, adapter, "adapter")?;

        let desc = wgpu::DeviceDescriptor {
            label: Some("ember device"),
            required_features: self.init.required_features,
            required_limits: self.init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        };
        let (device, queue) = block_on_request(
            record.adapter.request_device(&desc),
            self.init.request_timeout,
            || {
                let _ = record.instance.poll_all(false);
            },
            "device",
        )?
        .map_err(|e| GpuError::DeviceUnavailable(e.to_string()))?;

        self.diagnostics.install(&device);

        let adapter = record.adapter.clone();
        let handle = self.reg.devices.insert(DeviceRecord {
            device,
            queue,
            adapter,
        });
        log::trace!("created device {handle:?}");
        Ok(handle)
    }

    /// Returns a new handle to the device's queue; release it separately.
    pub fn get_queue(&mut self, device: DeviceHandle) -> Result<QueueHandle> {
        let queue = get(&self.reg.devices, device, "device")?.queue.clone();
        let handle = self.reg.queues.insert(queue);
        log::trace!("created queue {handle:?}");
        Ok(handle)
    }

    /// Adapter, device and queue in one call; stops at the first failure.
    pub fn acquire_device(
        &mut self,
        instance: InstanceHandle,
        surface: SurfaceHandle,
    ) -> Result<Acquired> {
        acquire::acquire(self, instance, surface)
    }
}

impl DeviceRequests for Gpu {
    fn request_adapter(
        &mut self,
        instance: InstanceHandle,
        surface: SurfaceHandle,
    ) -> Result<AdapterHandle> {
        Gpu::request_adapter(self, instance, surface)
    }

    fn request_device(&mut self, adapter: AdapterHandle) -> Result<DeviceHandle> {
        Gpu::request_device(self, adapter)
    }

    fn get_queue(&mut self, device: DeviceHandle) -> Result<QueueHandle> {
        Gpu::get_queue(self, device)
    }
}
