pub mod command;
pub mod ffmpeg;
pub mod runner;

#[cfg(test)]
mod runner_test;

// Tests that spawn processes hold this while they do, so no test forks while a stub script is still open for writing
#[cfg(test)]
pub(crate) static SPAWN_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

pub use runner::*;
