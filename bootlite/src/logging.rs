//! Tracing subscriber setup for hosts and the CLI.

use bootlite_shared::errors::{BootError, BootResult};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "bootlite.log";

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Filter directive. `RUST_LOG` wins when set; otherwise `info`.
    pub filter: Option<String>,
    /// Also write daily-rotated logs into this directory.
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when `log_dir` is set; keep it alive
/// for as long as logs should be flushed.
///
/// # Errors
///
/// Fails if the filter directive is invalid, the log directory cannot be
/// created, or a global subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> BootResult<Option<WorkerGuard>> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), options)?;

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BootError::Internal(format!("failed to install subscriber: {}", e)))?;

    Ok(guard)
}

/// A parsable `env` directive wins; otherwise the configured one.
fn build_filter(env: Option<&str>, options: &LoggingOptions) -> BootResult<EnvFilter> {
    if let Some(directive) = env
        && let Ok(filter) = EnvFilter::try_new(directive)
    {
        return Ok(filter);
    }

    EnvFilter::try_new(options.filter.as_deref().unwrap_or(DEFAULT_FILTER))
        .map_err(|e| BootError::Config(format!("invalid log filter: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(filter: Option<&str>) -> LoggingOptions {
        LoggingOptions {
            filter: filter.map(String::from),
            log_dir: None,
        }
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let err = build_filter(None, &options(Some("bootlite=notalevel"))).unwrap_err();
        assert!(matches!(err, BootError::Config(_)));
    }

    #[test]
    fn test_env_directive_wins_when_valid() {
        let filter = build_filter(Some("bootlite=trace"), &options(Some("warn"))).unwrap();
        assert_eq!(filter.to_string(), EnvFilter::new("bootlite=trace").to_string());

        let filter = build_filter(Some("bootlite=notalevel"), &options(Some("warn"))).unwrap();
        assert_eq!(filter.to_string(), EnvFilter::new("warn").to_string());

        let filter = build_filter(None, &options(None)).unwrap();
        assert_eq!(filter.to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());
    }
}
