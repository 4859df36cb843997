use crate::core::{AppConfig, ConversionOutcome, ConversionRequest, RangePolicy};
use crate::video::ffmpeg::FfmpegTool;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Read-only view of the runner, safe to hand to whatever draws the status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerSnapshot {
    pub converting: bool,
    pub active_request: Option<ConversionRequest>,
    pub last_outcome: Option<ConversionOutcome>,
    /// Attempts that reached the tool and finished, successfully or not.
    pub completed: u64,
}

impl RunnerSnapshot {
    pub fn status_line(&self) -> &'static str {
        if self.converting {
            return "Converting...";
        }
        match &self.last_outcome {
            None => "Select a file",
            Some(outcome) if outcome.is_success() => "Conversion complete",
            Some(_) => "Conversion failed",
        }
    }
}

#[derive(Debug, Default)]
struct RunnerState {
    active: Option<ConversionRequest>,
    last_outcome: Option<ConversionOutcome>,
    completed: u64,
}

fn lock(state: &Mutex<RunnerState>) -> MutexGuard<'_, RunnerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the in-flight slot when the worker ends, including by panic.
struct ActiveSlot {
    state: Arc<Mutex<RunnerState>>,
}

impl ActiveSlot {
    fn finish(self, outcome: &ConversionOutcome) {
        let mut state = lock(&self.state);
        state.last_outcome = Some(outcome.clone());
        state.completed += 1;
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        lock(&self.state).active = None;
    }
}

/// Receiving end of one conversion. Resolves to exactly one outcome.
///
/// Await it from async code, or call [`ConversionTicket::try_outcome`] once per frame from an
/// event loop that cannot block.
#[derive(Debug)]
pub struct ConversionTicket {
    receiver: oneshot::Receiver<ConversionOutcome>,
}

impl ConversionTicket {
    fn ready(outcome: ConversionOutcome) -> Self {
        let (sender, receiver) = oneshot::channel();
        // The receiver is alive right here, so this cannot fail
        let _ = sender.send(outcome);
        Self { receiver }
    }

    /// `None` while the worker is still running. Yields the outcome once; do not poll again after that.
    pub fn try_outcome(&mut self) -> Option<ConversionOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(worker_lost()),
        }
    }
}

impl Future for ConversionTicket {
    type Output = ConversionOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| worker_lost()))
    }
}

fn worker_lost() -> ConversionOutcome {
    ConversionOutcome::UnexpectedError("Conversion worker stopped without reporting a result".to_string())
}

/// Runs at most one ffmpeg conversion at a time on the runtime's blocking pool.
pub struct ConversionRunner {
    tool: FfmpegTool,
    policy: RangePolicy,
    handle: Handle,
    state: Arc<Mutex<RunnerState>>,
}

impl ConversionRunner {
    pub fn new(tool: FfmpegTool, policy: RangePolicy, handle: Handle) -> Self {
        Self {
            tool,
            policy,
            handle,
            state: Arc::new(Mutex::new(RunnerState::default())),
        }
    }

    pub fn from_config(config: &AppConfig, handle: Handle) -> Self {
        let tool = FfmpegTool::from_config(config.ffmpeg_path.as_deref());
        Self::new(tool, config.range_policy, handle)
    }

    pub fn tool(&self) -> &FfmpegTool {
        &self.tool
    }

    pub fn snapshot(&self) -> RunnerSnapshot {
        let state = lock(&self.state);
        RunnerSnapshot {
            converting: state.active.is_some(),
            active_request: state.active.clone(),
            last_outcome: state.last_outcome.clone(),
            completed: state.completed,
        }
    }

    /// Start a conversion. Invalid requests and requests made while another conversion is
    /// running resolve immediately without spawning anything.
    pub fn convert(&self, request: ConversionRequest) -> ConversionTicket {
        if let Err(e) = request.validate(self.policy) {
            log::warn!("Conversion request rejected: {}", e);
            return ConversionTicket::ready(e.into());
        }

        {
            let mut state = lock(&self.state);
            if state.active.is_some() {
                log::warn!("Conversion requested while another is running");
                return ConversionTicket::ready(ConversionOutcome::Busy);
            }
            state.active = Some(request.clone());
        }

        let slot = ActiveSlot {
            state: Arc::clone(&self.state),
        };
        let tool = self.tool.clone();
        let (sender, receiver) = oneshot::channel();

        self.handle.spawn_blocking(move || {
            log::info!(
                "Converting {} -> {}",
                request.source().display(),
                request.destination().display()
            );
            let started = Instant::now();
            let outcome = tool.run(&request);
            log::info!("Conversion finished in {:.1}s: {}", started.elapsed().as_secs_f64(), outcome);

            // Free the slot before reporting so the receiver can submit again right away
            slot.finish(&outcome);
            if sender.send(outcome).is_err() {
                log::debug!("Conversion outcome dropped, nobody is waiting for it");
            }
        });

        ConversionTicket { receiver }
    }
}
