use std::io::IsTerminal;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "tf.log";

/// Filter level for a `-v` count. `RUST_LOG` overrides it.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// CLI logging: human-readable lines on stderr
pub fn init_cli(verbose: u8) {
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level_for(verbose)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
    if let Err(err) = init_result {
        tracing::debug!(error = %err, "tracing subscriber already set, continuing");
    }
}

/// TUI logging: the screen belongs to ratatui, so events go to a daily log
/// file under `<config dir>/logs`. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init_tui(config_dir: &Path, verbose: u8) -> Option<WorkerGuard> {
    let log_dir = config_dir.join("logs");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // The TUI logs at info by default; there is no terminal to spam.
    let level = level_for(verbose.max(1));
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    if init_result.is_err() {
        return None;
    }
    Some(guard)
}
