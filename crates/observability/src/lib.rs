//! Tracing/logging setup and request correlation shared by the binaries.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}

/// Request correlation ids.
pub mod request_id;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::request_id::{REQUEST_ID_HEADER, RequestId};
pub use self::tracing::LogFormat;
