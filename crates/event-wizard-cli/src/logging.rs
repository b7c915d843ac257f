//! Structured logging using tracing.
//!
//! Logs go to stderr so they never interleave with the wizard's prompts.

use anyhow::anyhow;
use std::io;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Initialize logging. `RUST_LOG` takes precedence over `default_filter`.
pub fn init_logging(default_filter: &str, format: LogFormat) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(true)
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to set global default subscriber: {}", e))?;

    info!(log_format = %format, "Logging initialized");
    Ok(())
}
