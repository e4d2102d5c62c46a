//! Bridge into the `tracing` ecosystem
//!
//! Hosts that install a `tracing` subscriber get engine messages in their
//! normal pipeline, filterable by the `vtool_core` target.

use super::traits::Logger;

/// Logger forwarding every message to `tracing` macros
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "vtool_core", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "vtool_core", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "vtool_core", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "vtool_core", "{}", message);
    }
}
