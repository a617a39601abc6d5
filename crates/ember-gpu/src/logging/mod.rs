//! Logging and out-of-band diagnostics.
//!
//! Logger initialization lives here, together with the sink that collects
//! asynchronous GPU errors reported after device creation. Everything goes
//! through the standard `log` facade.

mod diagnostic;
mod init;

pub use diagnostic::{DiagnosticKind, DiagnosticSink, GpuDiagnostic};
pub use init::{LoggingConfig, init_logging};
