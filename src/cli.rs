use crate::core::{default_destination, AppConfig, ConversionRequest, ConversionSettings, RangePolicy};
use clap::Parser;
use std::path::PathBuf;

/// Convert a video clip into an animated GIF using ffmpeg.
///
/// Values not given on the command line come from the config file, then from built-in defaults
/// (start 0s, duration 5s, 10 fps, scale 0.5).
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Video to convert (webm, mp4, avi, mov, mkv)
    pub input: Option<PathBuf>,

    /// GIF to write. Defaults to the input path with a .gif extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start offset in seconds
    #[arg(short, long, allow_negative_numbers = true)]
    pub start: Option<f64>,

    /// Length of the clip in seconds
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Frames per second of the GIF
    #[arg(short = 'r', long)]
    pub fps: Option<u32>,

    /// Size multiplier applied to both width and height
    #[arg(long)]
    pub scale: Option<f64>,

    /// Path to the ffmpeg binary (looked up on PATH otherwise)
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Reject out-of-range values and missing sources before running ffmpeg
    #[arg(long)]
    pub strict: bool,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    pub save_defaults: bool,

    /// Only check that ffmpeg can be started, then exit
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(AppConfig::config_path)
    }

    /// Layers the command line over a loaded config.
    pub fn merge_config(&self, mut config: AppConfig) -> AppConfig {
        if let Some(ffmpeg) = &self.ffmpeg {
            config.ffmpeg_path = Some(ffmpeg.clone());
        }
        if self.strict {
            config.range_policy = RangePolicy::Reject;
        }
        config.defaults = self.settings(&config.defaults);
        config
    }

    pub fn settings(&self, defaults: &ConversionSettings) -> ConversionSettings {
        ConversionSettings {
            start_offset: self.start.unwrap_or(defaults.start_offset),
            duration: self.duration.unwrap_or(defaults.duration),
            frame_rate: self.fps.unwrap_or(defaults.frame_rate),
            scale_factor: self.scale.unwrap_or(defaults.scale_factor),
        }
    }

    /// A missing input becomes an empty path, which the runner reports as missing input.
    pub fn request(&self, defaults: &ConversionSettings) -> ConversionRequest {
        let source = self.input.clone().unwrap_or_default();
        let destination = self
            .output
            .clone()
            .unwrap_or_else(|| default_destination(&source));
        ConversionRequest::new(source, destination, self.settings(defaults))
    }
}
