use log::{error, info, log_enabled, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// Log records go to stderr, so they never interleave with the text, CSV or
/// netdata feeds written to stdout. The default level is `warn`; override it
/// with `RUST_LOG`.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
