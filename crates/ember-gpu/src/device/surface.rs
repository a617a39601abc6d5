use super::{Gpu, SurfaceErrorAction};
use crate::error::{GpuError, Result};
use crate::registry::{DeviceHandle, SurfaceHandle, SurfaceRecord, get, get_mut};

/// Picks `preferred` when the surface supports it, else its first format.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    preferred: wgpu::TextureFormat,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.contains(&preferred) {
        return Some(preferred);
    }
    caps.formats.first().copied()
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        requested
    } else {
        wgpu::PresentMode::Fifo
    }
}

/// Maps an acquisition failure to the frame loop's response.
pub(crate) fn surface_error_action(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        // Timeout and anything the backend cannot classify.
        _ => SurfaceErrorAction::SkipFrame,
    }
}

/// `true` while the recorded size cannot be configured (minimized window).
pub(crate) fn is_deferred(size: (u32, u32)) -> bool {
    size.0 == 0 || size.1 == 0
}

/// Re-applies the stored configuration unless it is deferred.
pub(crate) fn reconfigure(record: &SurfaceRecord) {
    if record.size.is_none_or(is_deferred) {
        return;
    }
    if let (Some(device), Some(config)) = (&record.device, &record.config) {
        record.surface.configure(device, config);
    }
}

impl Gpu {
    /// Configures `surface` for presentation from `device`.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only the size is recorded and configuration is deferred until a later
    /// call with a non-zero size.
    pub fn configure_surface(
        &mut self,
        surface: SurfaceHandle,
        device: DeviceHandle,
        width: u32,
        height: u32,
    ) -> Result<()> {
        get(&self.reg.devices, device, "device")?;
        get(&self.reg.surfaces, surface, "surface")?;
        // A held frame texture blocks reconfiguration.
        self.abandon_frame_of(surface);

        let dev = get(&self.reg.devices, device, "device")?;
        let record = get_mut(&mut self.reg.surfaces, surface, "surface")?;

        record.size = Some((width, height));
        if is_deferred((width, height)) {
            log::debug!("surface {surface:?} configure deferred at {width}x{height}");
            return Ok(());
        }

        let caps = record.surface.get_capabilities(&dev.adapter);
        let format = choose_surface_format(&caps, self.init.preferred_format)
            .ok_or(GpuError::SurfaceUnsupported)?;
        if format != self.init.preferred_format {
            log::warn!(
                "surface does not support {:?}; presenting as {format:?}",
                self.init.preferred_format
            );
        }

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: choose_present_mode(&caps, self.init.present_mode),
            alpha_mode: choose_alpha_mode(&caps, self.init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: self.init.desired_maximum_frame_latency,
        };
        record.surface.configure(&dev.device, &config);
        log::debug!("configured surface {surface:?}: {width}x{height} {format:?}");

        record.device = Some(dev.device.clone());
        record.config = Some(config);
        self.presentation_format = format;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<wgpu::TextureFormat>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes: vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            ..Default::default()
        }
    }

    // ── format selection ──────────────────────────────────────────────────

    #[test]
    fn preferred_format_wins_when_supported() {
        let c = caps(vec![
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureFormat::Bgra8Unorm,
        ]);
        assert_eq!(
            choose_surface_format(&c, wgpu::TextureFormat::Bgra8Unorm),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn falls_back_to_first_supported() {
        let c = caps(vec![wgpu::TextureFormat::Rgba8UnormSrgb]);
        assert_eq!(
            choose_surface_format(&c, wgpu::TextureFormat::Bgra8Unorm),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(choose_surface_format(&caps(vec![]), wgpu::TextureFormat::Bgra8Unorm), None);
    }

    #[test]
    fn unsupported_modes_fall_back() {
        let c = caps(vec![wgpu::TextureFormat::Bgra8Unorm]);
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Immediate),
            wgpu::PresentMode::Fifo
        );
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Mailbox
        );
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
    }

    // ── acquisition failures ──────────────────────────────────────────────

    #[test]
    fn only_out_of_memory_is_fatal() {
        use wgpu::SurfaceError as E;
        assert_eq!(surface_error_action(&E::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(surface_error_action(&E::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(surface_error_action(&E::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(surface_error_action(&E::Other), SurfaceErrorAction::SkipFrame);
        assert_eq!(surface_error_action(&E::OutOfMemory), SurfaceErrorAction::Fatal);
    }

    #[test]
    fn zero_sizes_are_deferred() {
        assert!(is_deferred((0, 600)));
        assert!(is_deferred((800, 0)));
        assert!(!is_deferred((1, 1)));
    }
}
