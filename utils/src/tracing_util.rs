//! Helpers related to tracing, used by main entrypoints

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with the default configuration.
///
/// The filter is taken from `RUST_LOG`; anything at `info` and above is shown
/// when it is unset.
pub fn initialize_tracing() {
    // Don't include timestamps and such because they're not really useful and
    // too verbose, and plus several log targets such as journald will already
    // include timestamps.
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    // Log to stderr; stdout belongs to the delegate
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(format)
        .with_writer(std::io::stderr)
        .init();
}
