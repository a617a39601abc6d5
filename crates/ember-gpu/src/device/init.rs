use std::time::Duration;

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may select from.
    pub backends: wgpu::Backends,

    /// Per-backend instance options.
    pub backend_options: wgpu::BackendOptions,

    pub power_preference: wgpu::PowerPreference,

    /// Use a software adapter even when hardware is available.
    pub force_fallback_adapter: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is always supported; an unsupported choice falls back to it.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Presentation format used when the surface supports it.
    ///
    /// Otherwise the surface's first reported format is used. Pipelines built
    /// without an explicit color format target whichever format was chosen.
    pub preferred_format: wgpu::TextureFormat,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,

    /// Upper bound on a blocking adapter or device request.
    ///
    /// `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            backend_options: wgpu::BackendOptions::default(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            preferred_format: wgpu::TextureFormat::Bgra8Unorm,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl GpuInit {
    /// Software backend that accepts every call and draws nothing.
    ///
    /// Only usable when wgpu is built with its `noop` feature; otherwise the
    /// adapter request fails with [`AdapterUnavailable`](crate::GpuError::AdapterUnavailable).
    pub fn noop() -> Self {
        Self {
            backends: wgpu::Backends::NOOP,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions { enable: true },
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
