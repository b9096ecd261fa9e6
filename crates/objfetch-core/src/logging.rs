//! Logging init: file under the XDG state dir, with stderr fallback.

use std::fs;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,objfetch=debug"))
}

/// Initialize structured logging to `~/.local/state/objfetch/objfetch.log`.
/// Falls back to stderr when the log file cannot be opened (e.g. unwritable
/// state dir) so the CLI still runs.
pub fn init() {
    match open_log_file() {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .with_ansi(false)
                .init();
            tracing::debug!("logging to stderr, log file unavailable: {}", err);
        }
    }
}

fn open_log_file() -> anyhow::Result<fs::File> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("objfetch")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("objfetch.log"))?;
    Ok(file)
}
