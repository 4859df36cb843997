use crate::core::{ConversionOutcome, ConversionRequest};
use crate::video::command::build_command;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const DEFAULT_PROGRAM: &str = "ffmpeg";

/// The external ffmpeg binary, either configured explicitly or looked up on PATH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTool {
    program: PathBuf,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
        }
    }
}

impl FfmpegTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::new(path),
            None => Self::default(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run one conversion to completion. Blocks the calling thread.
    pub fn run(&self, request: &ConversionRequest) -> ConversionOutcome {
        let mut cmd = build_command(&self.program, request);
        log::debug!("Executing FFmpeg: {:?}", cmd);

        match cmd.output() {
            Ok(output) => classify_output(&output),
            Err(e) => classify_spawn_error(&self.program, e),
        }
    }

    /// First line of `ffmpeg -version`.
    pub fn version(&self) -> Result<String, ConversionOutcome> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| classify_spawn_error(&self.program, e))?;

        if !output.status.success() {
            return Err(classify_output(&output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

fn classify_output(output: &Output) -> ConversionOutcome {
    if output.status.success() {
        log::debug!("FFmpeg process completed successfully");
        return ConversionOutcome::Success;
    }

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    log::debug!("FFmpeg process failed with {}", output.status);
    if stderr.is_empty() {
        ConversionOutcome::ToolFailed(format!("ffmpeg exited with {}", output.status))
    } else {
        ConversionOutcome::ToolFailed(stderr)
    }
}

fn classify_spawn_error(program: &Path, e: std::io::Error) -> ConversionOutcome {
    if e.kind() == ErrorKind::NotFound {
        log::warn!("FFmpeg binary not found: {}", program.display());
        ConversionOutcome::ToolNotFound
    } else {
        log::error!("Failed to start {}: {}", program.display(), e);
        ConversionOutcome::UnexpectedError(format!("Failed to start {}: {}", program.display(), e))
    }
}
