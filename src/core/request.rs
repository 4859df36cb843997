use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Input extensions offered by file pickers. Not enforced.
pub const INPUT_EXTENSIONS: [&str; 5] = ["webm", "mp4", "avi", "mov", "mkv"];
pub const OUTPUT_EXTENSION: &str = "gif";

pub const START_OFFSET_RANGE: RangeInclusive<f64> = 0.0..=999.0;
pub const DURATION_RANGE: RangeInclusive<f64> = 0.1..=60.0;
pub const FRAME_RATE_RANGE: RangeInclusive<u32> = 1..=30;
pub const SCALE_FACTOR_RANGE: RangeInclusive<f64> = 0.1..=2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    Source,
    Destination,
    StartOffset,
    Duration,
    FrameRate,
    ScaleFactor,
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestField::Source => "source file",
            RequestField::Destination => "destination file",
            RequestField::StartOffset => "start offset",
            RequestField::Duration => "duration",
            RequestField::FrameRate => "frame rate",
            RequestField::ScaleFactor => "scale factor",
        };
        f.write_str(name)
    }
}

/// How numeric fields are checked before the tool is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// Only empty paths are rejected; numbers go to ffmpeg as given.
    #[default]
    PassThrough,
    /// Numbers must sit inside the form ranges and the source must exist.
    Reject,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("No {0} selected")]
    MissingInput(RequestField),

    #[error("{field} {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        field: RequestField,
        value: String,
        min: String,
        max: String,
    },

    #[error("Source file does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// The numeric half of a conversion request. Also persisted as the form defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    pub start_offset: f64, // seconds
    pub duration: f64,     // seconds
    pub frame_rate: u32,
    pub scale_factor: f64,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            start_offset: 0.0,
            duration: 5.0,
            frame_rate: 10,
            scale_factor: 0.5,
        }
    }
}

impl ConversionSettings {
    pub fn check_ranges(&self) -> Result<(), RequestError> {
        check_f64(RequestField::StartOffset, self.start_offset, &START_OFFSET_RANGE)?;
        check_f64(RequestField::Duration, self.duration, &DURATION_RANGE)?;
        if !FRAME_RATE_RANGE.contains(&self.frame_rate) {
            return Err(RequestError::OutOfRange {
                field: RequestField::FrameRate,
                value: self.frame_rate.to_string(),
                min: FRAME_RATE_RANGE.start().to_string(),
                max: FRAME_RATE_RANGE.end().to_string(),
            });
        }
        check_f64(RequestField::ScaleFactor, self.scale_factor, &SCALE_FACTOR_RANGE)?;
        Ok(())
    }
}

fn check_f64(field: RequestField, value: f64, range: &RangeInclusive<f64>) -> Result<(), RequestError> {
    // NaN fails `contains`, so non-finite input is caught here too
    if range.contains(&value) {
        Ok(())
    } else {
        Err(RequestError::OutOfRange {
            field,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        })
    }
}

/// One conversion attempt. Built right before submission and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    source: PathBuf,
    destination: PathBuf,
    settings: ConversionSettings,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, settings: ConversionSettings) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            settings,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn start_offset(&self) -> f64 {
        self.settings.start_offset
    }

    pub fn duration(&self) -> f64 {
        self.settings.duration
    }

    pub fn frame_rate(&self) -> u32 {
        self.settings.frame_rate
    }

    pub fn scale_factor(&self) -> f64 {
        self.settings.scale_factor
    }

    pub fn validate(&self, policy: RangePolicy) -> Result<(), RequestError> {
        if self.source.as_os_str().is_empty() {
            return Err(RequestError::MissingInput(RequestField::Source));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(RequestError::MissingInput(RequestField::Destination));
        }

        if policy == RangePolicy::Reject {
            self.settings.check_ranges()?;
            if !self.source.is_file() {
                return Err(RequestError::SourceNotFound(self.source.clone()));
            }
        }

        Ok(())
    }
}

/// `clips/intro.webm` becomes `clips/intro.gif`.
pub fn default_destination(source: &Path) -> PathBuf {
    if source.as_os_str().is_empty() {
        return PathBuf::new();
    }
    source.with_extension(OUTPUT_EXTENSION)
}

pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| INPUT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
