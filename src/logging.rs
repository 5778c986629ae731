//! Logging setup: colored console output plus an optional append-only file.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Map a configured level name to a tracing level. Unknown names mean INFO.
fn parse_level(level: &str) -> Level {
    level
        .trim()
        .to_ascii_lowercase()
        .replace("warning", "warn")
        .parse()
        .unwrap_or(Level::INFO)
}

/// `RUST_LOG` directives, with the configured level added on top.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

fn open_log_file(path: &str) -> Result<File> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn install(level: &str, log_file: Option<File>) {
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(file_layer)
        .init();
}

/// Initialize logging. An empty `file` setting logs to the console only.
///
/// Fails without installing anything when the log file cannot be opened,
/// so the caller may fall back to [`init_console_only`].
pub fn init(config: &LoggingConfig) -> Result<()> {
    let log_file = if config.file.is_empty() {
        None
    } else {
        Some(open_log_file(&config.file)?)
    };
    install(&config.level, log_file);
    Ok(())
}

/// Console-only logging.
pub fn init_console_only(level: &str) {
    install(level, None);
}
