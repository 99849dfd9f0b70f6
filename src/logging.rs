use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the file writer flushing; hold it until the process exits.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Console logs go to stderr so stdout carries only the final report.
/// With `log_dir` set, a daily-rotated `pwscale.log` is written there too.
pub fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Option<LogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(true);
    let registry = tracing_subscriber::registry().with(env_filter).with(console);

    let Some(dir) = log_dir else {
        registry.init();
        return None;
    };
    if let Err(err) = std::fs::create_dir_all(dir) {
        registry.init();
        tracing::warn!(dir = %dir.display(), error = %err, "file logging disabled");
        return None;
    }

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, "pwscale.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .init();
    Some(LogGuard { _guard: guard })
}
