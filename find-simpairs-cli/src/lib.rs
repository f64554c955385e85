//! Helpers shared by the command-line tools.
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a subscriber printing events to the standard error output.
///
/// The filter is read from `RUST_LOG`, and events at `INFO` and above are always shown.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();
}
