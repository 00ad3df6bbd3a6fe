//! Command-line configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::driver::DEFAULT_TARGET_FPS;
use crate::logging::LogConfig;
use crate::style::{ColorTheme, StyleSettings, VisualMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Capture system audio
    Live,
    /// Built-in sample track
    Demo,
}

impl SourceKind {
    pub fn other(self) -> Self {
        match self {
            SourceKind::Live => SourceKind::Demo,
            SourceKind::Demo => SourceKind::Live,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "spectrum-visualizer")]
#[command(about = "Real-time audio spectrum visualizer for the terminal", long_about = None)]
pub struct Args {
    /// Visual style to start with
    #[arg(long, value_enum, default_value_t = VisualMode::Bars)]
    pub mode: VisualMode,

    /// Color theme
    #[arg(long, value_enum, default_value_t = ColorTheme::Rainbow)]
    pub theme: ColorTheme,

    /// Magnitude response multiplier
    #[arg(long, default_value_t = 1.0)]
    pub sensitivity: f32,

    /// Size, opacity and glow multiplier
    #[arg(long, default_value_t = 1.0)]
    pub intensity: f32,

    /// Maximum frames drawn per second
    #[arg(long, value_name = "FPS", default_value_t = DEFAULT_TARGET_FPS)]
    pub fps: u32,

    /// Number of frequency bins per snapshot
    #[arg(long, value_name = "COUNT", default_value_t = 64)]
    pub bins: usize,

    /// Where frequency data comes from
    #[arg(long, value_enum, default_value_t = SourceKind::Live)]
    pub source: SourceKind,

    /// Capture the default input device instead of the output loopback
    #[arg(long)]
    pub input: bool,

    /// Canvas pixels per terminal half-cell
    #[arg(long, value_name = "RATIO", default_value_t = 1.0)]
    pub pixel_ratio: f32,

    /// Seed for particle layout (random when absent)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start with playback paused
    #[arg(long)]
    pub paused: bool,

    /// Length of the sample track
    #[arg(long, value_name = "SECONDS", default_value_t = 180)]
    pub demo_length: u64,

    /// Restart the sample track when it ends
    #[arg(long = "loop")]
    pub looping: bool,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("--fps must be at least 1")]
    ZeroFps,
    #[error("--bins must be at least 1")]
    ZeroBins,
    #[error("--pixel-ratio must be a positive number, got {0}")]
    PixelRatio(f32),
    #[error("--{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settings: StyleSettings,
    pub target_fps: u32,
    pub bins: usize,
    pub source: SourceKind,
    pub capture_input: bool,
    pub pixel_ratio: f32,
    pub seed: Option<u64>,
    pub start_paused: bool,
    pub looping: bool,
    pub demo_seconds: u64,
    pub log: LogConfig,
}

impl EngineConfig {
    /// Sample track length in source frames (one per drawn frame).
    pub fn demo_frames(&self) -> u64 {
        self.demo_seconds * self.target_fps as u64
    }
}

impl TryFrom<Args> for EngineConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if args.bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        if !(args.pixel_ratio.is_finite() && args.pixel_ratio > 0.0) {
            return Err(ConfigError::PixelRatio(args.pixel_ratio));
        }
        for (name, value) in [("sensitivity", args.sensitivity), ("intensity", args.intensity)] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        let level: LevelFilter = args
            .log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(args.log_level.clone()))?;

        Ok(Self {
            settings: StyleSettings {
                sensitivity: args.sensitivity,
                intensity: args.intensity,
                color_theme: args.theme,
                active_mode: args.mode,
                ..StyleSettings::default()
            },
            target_fps: args.fps,
            bins: args.bins,
            source: args.source,
            capture_input: args.input,
            pixel_ratio: args.pixel_ratio,
            seed: args.seed,
            start_paused: args.paused,
            looping: args.looping,
            demo_seconds: args.demo_length,
            log: LogConfig {
                file: args.log_file,
                level,
            },
        })
    }
}
