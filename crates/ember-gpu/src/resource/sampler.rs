use crate::device::Gpu;
use crate::error::Result;
use crate::registry::{DeviceHandle, SamplerHandle, get};

impl Gpu {
    /// Creates a sampler with one address mode for all three axes.
    ///
    /// Mipmap filtering stays nearest and anisotropy stays 1.
    pub fn create_sampler(
        &mut self,
        device: DeviceHandle,
        address_mode: wgpu::AddressMode,
        mag_filter: wgpu::FilterMode,
        min_filter: wgpu::FilterMode,
    ) -> Result<SamplerHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let sampler = dev.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter,
            min_filter,
            ..Default::default()
        });
        let handle = self.reg.samplers.insert(sampler);
        log::trace!("created sampler {handle:?}");
        Ok(handle)
    }
}
