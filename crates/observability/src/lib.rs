//! Tracing and logging setup shared by the binaries.

/// Subscriber configuration and initialization.
pub mod tracing;

pub use self::tracing::{LogConfig, LogConfigError, LogFormat};

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(config: &LogConfig) {
    self::tracing::init(config);
}
