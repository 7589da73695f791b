//! Tracing subscriber setup.

/// Install the global `fmt` subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Targets are printed
/// so `state`, `transfer` and `local` lines can be told apart. Logs go to
/// stderr; stdout is reserved for command output. Calling this more than
/// once is harmless.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
