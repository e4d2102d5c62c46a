//! Logging abstractions for runtime-agnostic logging

mod console;
mod memory;
mod noop;
mod tracing_logger;
mod traits;

pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;
pub use traits::{LogLevel, Logger, SharedLogger};
