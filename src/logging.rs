//! File logging. Stdout belongs to the terminal, so everything goes to a
//! daily log file.

use crate::core::config::ProgramConfig;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "tvkit=info";

/// Keeps the background writer alive; drop it last.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Where logs go: the configured directory, else a per-user temp dir.
pub fn log_dir(config: &ProgramConfig) -> PathBuf {
    config
        .log_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tvkit").join("logs"))
}

/// `RUST_LOG` wins over the configured filter, which wins over the default.
pub fn filter_directive(config: &ProgramConfig, env: Option<String>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

pub fn init(config: &ProgramConfig) -> Option<LoggingGuard> {
    let log_dir = log_dir(config);
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "tvkit.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let directive = filter_directive(config, std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(panic = %panic_info, "panic");
        previous(panic_info);
    }));

    tracing::info!(log_dir = %log_dir.display(), filter = %directive, "tracing initialized");

    Some(LoggingGuard {
        _guard: guard,
        log_dir,
    })
}

#[cfg(test)]
#[path = "../tests/unit/logging.rs"]
mod tests;
