use crate::core::request::{RequestError, RequestField};
use std::fmt;

/// How a single conversion attempt ended. Every attempt produces exactly one.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Success,
    /// Source or destination left empty; nothing was spawned.
    MissingInput(RequestField),
    /// Rejected by a strict range policy before invocation.
    InvalidParameter(String),
    /// Another conversion was already running.
    Busy,
    ToolNotFound,
    /// Non-zero exit. Carries the tool's stderr as captured.
    ToolFailed(String),
    UnexpectedError(String),
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success)
    }

    /// Text for the blocking notification shown once the attempt is over.
    pub fn notification(&self) -> String {
        match self {
            ConversionOutcome::Success => "GIF file created".to_string(),
            ConversionOutcome::Busy => "A conversion is already running".to_string(),
            other => format!("An error occurred during conversion:\n{}", other),
        }
    }
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionOutcome::Success => write!(f, "Conversion complete"),
            ConversionOutcome::MissingInput(field) => write!(f, "Please select a {}", field),
            ConversionOutcome::InvalidParameter(message) => write!(f, "Invalid parameter: {}", message),
            ConversionOutcome::Busy => write!(f, "Busy: a conversion is already in progress"),
            ConversionOutcome::ToolNotFound => {
                write!(f, "ffmpeg not found. Please install ffmpeg or set its path in the config")
            }
            ConversionOutcome::ToolFailed(stderr) => write!(f, "ffmpeg error: {}", stderr.trim_end()),
            ConversionOutcome::UnexpectedError(message) => write!(f, "{}", message),
        }
    }
}

impl From<RequestError> for ConversionOutcome {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::MissingInput(field) => ConversionOutcome::MissingInput(field),
            other => ConversionOutcome::InvalidParameter(other.to_string()),
        }
    }
}
