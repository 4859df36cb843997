use crate::core::ConversionRequest;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

/// `fps=<rate>,scale=iw*<factor>:ih*<factor>`, the same factor on both axes.
pub fn filter_expression(frame_rate: u32, scale_factor: f64) -> String {
    format!("fps={},scale=iw*{}:ih*{}", frame_rate, scale_factor, scale_factor)
}

/// Arguments for ffmpeg, in the order the tool expects them.
pub fn build_args(request: &ConversionRequest) -> Vec<OsString> {
    // Shortest round-trip form, so the tool sees exactly the value that was entered
    let start_time = request.start_offset().to_string();
    let duration = request.duration().to_string();

    vec![
        OsString::from("-i"),
        request.source().as_os_str().to_owned(),
        OsString::from("-ss"),
        OsString::from(start_time),
        OsString::from("-t"),
        OsString::from(duration),
        OsString::from("-vf"),
        OsString::from(filter_expression(request.frame_rate(), request.scale_factor())),
        OsString::from("-y"), // Overwrite output file
        request.destination().as_os_str().to_owned(),
    ]
}

pub fn build_command(program: &Path, request: &ConversionRequest) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(build_args(request))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    cmd
}
