use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over the configured level
fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
    Ok(data_dir.join("davinci").join("logs"))
}

/// Log to a daily file while the TUI owns the terminal.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_file(default_level: &str) -> Result<WorkerGuard> {
    let dir = log_dir()?;
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, "davinci.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init()?;

    tracing::info!(dir = %dir.display(), "logging initialized");
    Ok(guard)
}

/// Log to stderr for one-shot commands, leaving stdout to the answer
pub fn init_stderr(default_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_falls_back_to_configured_level() {
        // RUST_LOG takes precedence when the test runner sets it
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(filter("debug").to_string(), "debug");
            assert_eq!(filter("davinci_core=trace").to_string(), "davinci_core=trace");
        }
    }
}
