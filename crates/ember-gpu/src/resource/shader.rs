use crate::device::Gpu;
use crate::error::Result;
use crate::registry::{DeviceHandle, ShaderHandle, get};

impl Gpu {
    /// Compiles a WGSL module. Entry points are named at pipeline creation.
    ///
    /// Compilation errors arrive as diagnostics, not as an `Err`.
    pub fn create_shader(&mut self, device: DeviceHandle, wgsl: &str) -> Result<ShaderHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let module = dev.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });
        let handle = self.reg.shaders.insert(module);
        log::trace!("created shader {handle:?}");
        Ok(handle)
    }
}
