//! stderr logging. Zed collects extension stderr into its own log.
//!
//! The filter comes from `RUST_LOG` and defaults to `autohotkey_zed=info`.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "autohotkey_zed=info";

/// Installs the global subscriber. Later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false)
        .try_init();
}
