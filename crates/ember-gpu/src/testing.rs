//! Shared fixtures for unit tests.

use crate::device::{Acquired, Gpu, GpuInit};
use crate::registry::SurfaceHandle;

/// A device on the no-op backend, acquired without a surface.
pub(crate) fn noop_gpu() -> (Gpu, Acquired) {
    let mut gpu = Gpu::new(GpuInit::noop());
    let instance = gpu.create_instance();
    let acq = gpu
        .acquire_device(instance, SurfaceHandle::default())
        .expect("noop device");
    (gpu, acq)
}
