//! Diagnostic tracing for the assistant.
//!
//! stdout belongs to the operator dialogue, so diagnostics always go to
//! stderr. Filtering follows `RUST_LOG`; without it the default is `warn`,
//! or `debug` for this crate when `--verbose` is given.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=assistant=debug ai please show disk usage
/// ```
pub fn init(verbose: bool) {
    let default_directive = if verbose { "warn,assistant=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
