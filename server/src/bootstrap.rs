//! First-run scaffolding and log setup.
//!
//! Failures here are the only fatal conditions in the service: if the
//! working directory cannot be scaffolded or the config cannot be loaded,
//! the process exits before the runtime path begins.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Layout of the working directory, relative to the service root.
pub const STORAGE_FILE: &str = "storage.json";
pub const CONFIG_FILE: &str = "config/app.json";
pub const LOG_DIR: &str = "logs";
pub const ACTIONS_LOG: &str = "actions.log";
pub const REQUESTS_LOG: &str = "requests.log";
pub const HOMEPAGE_FILE: &str = "ui/views/index.html";
pub const STATIC_DIR: &str = "build";

/// Event target for the per-request access log; events carrying it go to
/// `logs/requests.log`, everything else goes to `logs/actions.log`.
pub const REQUEST_LOG_TARGET: &str = "postbox::requests";

/// Write `content` to `path` unless the file already exists, creating
/// parent directories as needed. Existing files are never touched.
pub fn create_if_missing(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// Create the config scaffold and log directory when absent. The store
/// file itself is bootstrapped by `AppendStore::open`.
pub fn scaffold(root: &Path) -> std::io::Result<()> {
    create_if_missing(&root.join(CONFIG_FILE), b"{}")?;
    std::fs::create_dir_all(root.join(LOG_DIR))
}

/// Initialize tracing with an env-filter (default `info`) and two file
/// writers: action events go to `logs/actions.log`, access-log events
/// (those with [`REQUEST_LOG_TARGET`]) go to `logs/requests.log`. The
/// returned guards must be held for the process lifetime so buffered log
/// lines are flushed.
pub fn init_logging(root: &Path) -> (WorkerGuard, WorkerGuard) {
    let log_dir = root.join(LOG_DIR);
    let (actions, actions_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, ACTIONS_LOG));
    let (requests, requests_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, REQUESTS_LOG));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(actions)
                .with_ansi(false)
                .with_filter(filter_fn(|metadata| {
                    metadata.target() != REQUEST_LOG_TARGET
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(requests)
                .with_ansi(false)
                .with_filter(filter_fn(|metadata| {
                    metadata.target() == REQUEST_LOG_TARGET
                })),
        )
        .init();

    (actions_guard, requests_guard)
}
