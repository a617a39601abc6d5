use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Upper bound on retained diagnostics; older entries are dropped first.
const MAX_RETAINED: usize = 256;

/// Category of an asynchronous GPU error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DiagnosticKind {
    Validation,
    OutOfMemory,
    Internal,
}

/// One error reported by the native layer outside of any call's return value.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl GpuDiagnostic {
    pub fn from_wgpu(error: &wgpu::Error) -> Self {
        let kind = match error {
            wgpu::Error::Validation { .. } => DiagnosticKind::Validation,
            wgpu::Error::OutOfMemory { .. } => DiagnosticKind::OutOfMemory,
            _ => DiagnosticKind::Internal,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// Shared collector for uncaptured device errors.
///
/// Cloned into the handler installed on every device. Reporting logs the
/// event immediately and keeps it until drained; it never interrupts the
/// caller's frame loop.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    events: Arc<Mutex<VecDeque<GpuDiagnostic>>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, diagnostic: GpuDiagnostic) {
        match diagnostic.kind {
            DiagnosticKind::Validation => log::error!("gpu validation: {}", diagnostic.message),
            DiagnosticKind::OutOfMemory => log::error!("gpu out of memory: {}", diagnostic.message),
            DiagnosticKind::Internal => log::warn!("gpu internal error: {}", diagnostic.message),
        }

        let mut events = self.events.lock();
        if events.len() == MAX_RETAINED {
            events.pop_front();
        }
        events.push_back(diagnostic);
    }

    /// Removes and returns every retained diagnostic, oldest first.
    pub fn drain(&self) -> Vec<GpuDiagnostic> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Installs this sink as `device`'s uncaptured-error handler.
    pub(crate) fn install(&self, device: &wgpu::Device) {
        let sink = self.clone();
        device.on_uncaptured_error(Arc::new(move |error: wgpu::Error| {
            sink.report(GpuDiagnostic::from_wgpu(&error));
        }));
    }
}
