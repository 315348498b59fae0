//! Logging Infrastructure
//!
//! Console logging by default; a daily rolling file when `LOG_DIR` names an
//! existing directory. `RUST_LOG` takes precedence over the configured level.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&Path>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && dir.is_dir()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "dispense-server");
        let _ = subscriber
            .with_writer(file_appender)
            .with_ansi(false)
            .try_init();
        return;
    }

    let _ = subscriber.try_init();
}
