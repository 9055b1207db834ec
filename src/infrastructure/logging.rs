//! Logging system initialization
//!
//! Console logging via tracing-subscriber with an EnvFilter, plus an optional
//! non-blocking file layer under the data directory. The appender guard is
//! kept alive for the process lifetime.

use std::path::Path;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking writer flushing until process exit
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialize the global subscriber. RUST_LOG overrides the configured level.
pub fn init_logging(config: &LoggingConfig, data_dir: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gsmarena_scraper_lib={0},{0}", config.level)));

    let console_layer = tracing_subscriber::fmt::layer().with_target(false);

    if config.file_output {
        let log_dir = data_dir.join("logs");
        std::fs::create_dir_all(&log_dir)?;
        let appender = tracing_appender::rolling::daily(log_dir, "gsmarena-scraper.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .init();
    }

    Ok(())
}
