//! Structured logging for the CLI's own diagnostics (§13.1's `log.level`).
//!
//! This governs the verbosity of the toolchain's *own* operational log
//! output (e.g. "loaded config from ..."); compiler and VM diagnostics
//! reported to the user are unaffected and always printed regardless of
//! this setting.

use lumen_config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Initializes a `tracing` subscriber filtered to `level`. Safe to call
/// more than once (e.g. from tests) — a second attempt is a no-op.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
