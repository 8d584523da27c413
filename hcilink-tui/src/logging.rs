use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "hcilink-tui.log";

/// The terminal belongs to the UI, so diagnostics go to a file. Keep the guard alive.
pub fn init_file_logging(debug: bool) -> Result<Option<WorkerGuard>> {
    if !debug {
        return Ok(None);
    }

    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("hcilink_core=debug,hcilink=debug")
        }))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    tracing::info!("File logging initialized");
    Ok(Some(guard))
}
