//! Logging setup for host apps.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by `level` (an `EnvFilter` directive such
/// as `"info"` or `"dose_journal_core=debug"`). `RUST_LOG` takes precedence.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).try_init().is_ok()
}
