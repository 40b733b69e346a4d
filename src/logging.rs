use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::Config;
use crate::config::LogFormat;
use crate::error::Result;
use crate::error::WtfError;

/// Install the global tracing subscriber.
///
/// A single `fmt` layer gated by an `EnvFilter` derived from `log_level`,
/// writing to a daily-rotated file via `tracing_appender`. `log_format`
/// selects JSON vs. human-readable text. Returns the appender guard; the
/// caller must keep it alive for the process lifetime or buffered lines are
/// lost on exit.
pub fn init(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = crate::config::wtf_home()?.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|source| WtfError::ConfigRead {
        path: log_dir.clone(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "wtf_cli.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(level_str(config)).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    match config.log_format {
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.json())
                .try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init();
        }
    }

    Ok(guard)
}

fn level_str(config: &Config) -> &'static str {
    use crate::config::LogLevel::*;
    match config.log_level {
        Trace => "trace",
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}
