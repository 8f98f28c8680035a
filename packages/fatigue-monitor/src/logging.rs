use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub const LOG_FILE_PREFIX: &str = "fatigue-monitor.log";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Installs the global subscriber from `config.log_level` and, when
/// `config.log_dir` is set, a daily rolling file next to the console output.
/// Keep the returned guard alive for the whole session or buffered file
/// output is lost.
pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout 可能被用作数据管道，日志统一走 stderr
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let Some((file_appender, log_dir)) = config
        .log_dir
        .as_deref()
        .and_then(|dir| rolling_appender(dir).map(|appender| (appender, dir)))
    else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return None;
    };

    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    tracing::debug!(log_dir = %log_dir.display(), "file logging enabled");

    Some(FileLogGuard { _guard: guard })
}

/// `None` when the directory cannot be created; the session then logs to the
/// console only.
fn rolling_appender(log_dir: &Path) -> Option<RollingFileAppender> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }
    Some(RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX))
}
