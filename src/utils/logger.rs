//! Logging utilities
//!
//! Provides tracing setup for embedding runners.

use tracing_subscriber::EnvFilter;

/// Initialize tracing output. Honors `RUST_LOG`, defaulting to info-level
/// output for this crate. Safe to call more than once; later calls are
/// no-ops.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("testpool=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .ok();
}
