//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initialise logging to stderr.
///
/// Without `debug` the level is pinned to `info` even if `RUST_LOG` is set.
/// With it, `RUST_LOG` may override the `debug` default (e.g. `trace` to
/// see per-frame hover changes).
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
