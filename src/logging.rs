use tracing_subscriber::{fmt, EnvFilter};

/// Diagnostics go to stderr so stdout carries only the per-queue lines.
/// RUST_LOG=info,debug,... (defaults to info)
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
