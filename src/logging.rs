use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{
    Layer,
    filter::{EnvFilter, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Log destination. The terminal belongs to the renderer, so there is no
    /// console output; without a file nothing is logged.
    pub file: Option<PathBuf>,
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: LevelFilter::INFO,
        }
    }
}

impl LogConfig {
    pub fn filter(&self) -> EnvFilter {
        // RUST_LOG takes precedence over the configured level.
        EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy()
    }
}

/// Initialize the logging system. Returns whether a subscriber was installed.
pub fn init(config: &LogConfig) -> Result<bool> {
    let Some(path) = &config.file else {
        return Ok(false);
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {:?}", path))?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(config.filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized at level: {}", config.level);
    Ok(true)
}
