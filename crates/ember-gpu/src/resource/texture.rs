use crate::device::Gpu;
use crate::error::{GpuError, Result};
use crate::registry::{
    DeviceHandle, QueueHandle, TextureHandle, TextureViewHandle, ViewRecord, get,
};

/// Format of textures made by [`Gpu::create_depth_texture`] and expected by
/// depth-enabled pipelines.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Cells per side of [`gen_checkerboard`].
const CHECKER_CELLS: u32 = 8;

impl Gpu {
    /// Creates a 2D texture with a single array layer.
    pub fn create_texture(
        &mut self,
        device: DeviceHandle,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        mip_level_count: u32,
    ) -> Result<TextureHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let texture = dev.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let handle = self.reg.textures.insert(texture);
        log::trace!("created texture {handle:?} ({width}x{height} {format:?})");
        Ok(handle)
    }

    /// Render-attachment depth texture in [`DEPTH_FORMAT`] with one mip level.
    pub fn create_depth_texture(
        &mut self,
        device: DeviceHandle,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle> {
        self.create_texture(
            device,
            width,
            height,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            1,
        )
    }

    /// Default view over the whole texture.
    pub fn create_texture_view(&mut self, texture: TextureHandle) -> Result<TextureViewHandle> {
        let view = get(&self.reg.textures, texture, "texture")?
            .create_view(&wgpu::TextureViewDescriptor::default());
        let handle = self.reg.texture_views.insert(ViewRecord {
            view,
            frame_of: None,
        });
        log::trace!("created texture view {handle:?} of {texture:?}");
        Ok(handle)
    }

    /// Uploads tightly packed rows into mip level 0.
    pub fn queue_write_texture(
        &self,
        queue: QueueHandle,
        texture: TextureHandle,
        data: &[u8],
        bytes_per_row: u32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let queue = get(&self.reg.queues, queue, "queue")?;
        let texture = get(&self.reg.textures, texture, "texture")?;

        if (data.len() as u64) < u64::from(bytes_per_row) * u64::from(height) {
            return Err(GpuError::TextureDataTooShort {
                len: data.len(),
                rows: height,
                bytes_per_row,
            });
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }
}

/// RGBA8 checkerboard of `size`×`size` pixels with 8 cells per side.
///
/// Cells are `max(1, size / 8)` pixels wide; the cell at the origin uses `a`.
pub fn gen_checkerboard(size: u32, a: [u8; 3], b: [u8; 3]) -> Vec<u8> {
    let cell = (size / CHECKER_CELLS).max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let [r, g, b] = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    fn pixel(data: &[u8], size: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * size + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn sixteen_pixel_board_uses_two_pixel_cells() {
        let data = gen_checkerboard(16, RED, BLUE);
        assert_eq!(data.len(), 16 * 16 * 4);
        assert_eq!(pixel(&data, 16, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, 16, 1, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, 16, 1, 1), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, 16, 2, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&data, 16, 3, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&data, 16, 2, 2), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, 16, 15, 15), [255, 0, 0, 255]);
    }

    #[test]
    fn alpha_is_always_opaque() {
        let data = gen_checkerboard(24, RED, BLUE);
        assert!(data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn small_boards_use_single_pixel_cells() {
        let data = gen_checkerboard(4, RED, BLUE);
        assert_eq!(pixel(&data, 4, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, 4, 1, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&data, 4, 1, 1), [255, 0, 0, 255]);
        assert!(gen_checkerboard(0, RED, BLUE).is_empty());
    }
}
