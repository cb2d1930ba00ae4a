use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use std::{fs::OpenOptions, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// Sends log records to the configured file. The terminal belongs to the
/// window, so nothing is ever written to stdout or stderr.
pub fn init(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
}
