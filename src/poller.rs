use crate::error::SampleError;
use crate::model::Reading;
use crate::monitor::SampleSource;
use crate::stream::{RenderableGrid, StreamBuffer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Probing,
    Running,
    Stopped,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    Failed,
}

/// A persistent problem that replaced a pane's graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub pane: String,
    pub message: String,
}

/// What the presentation layer sees of a poller: the latest rendered state.
#[derive(Clone, Debug)]
pub struct PaneFrame {
    pub name: String,
    pub state: PollerState,
    pub grid: RenderableGrid,
    pub latest: Option<Reading>,
    pub diagnostic: Option<String>,
    pub last_error: Option<String>,
    pub samples: u64,
}

/// Handed back to the owner once a poller task ends.
#[derive(Debug)]
pub struct PollerReport {
    pub name: String,
    pub state: PollerState,
    pub stop: StopReason,
    pub ticks: u64,
    pub last_error: Option<SampleError>,
    pub buffer: StreamBuffer,
}

/// Channels a poller uses to talk to its owner.
#[derive(Clone)]
pub struct PollerLinks {
    pub redraw: Arc<Notify>,
    pub diagnostics: mpsc::UnboundedSender<Diagnostic>,
}

impl PollerLinks {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Diagnostic>) {
        let (diagnostics, rx) = mpsc::unbounded_channel();
        let links = Self {
            redraw: Arc::new(Notify::new()),
            diagnostics,
        };
        (links, rx)
    }
}

/// Samples one [`SampleSource`] on a fixed interval into the [`StreamBuffer`] it owns.
pub struct Poller<S> {
    name: String,
    source: S,
    buffer: StreamBuffer,
    interval: Duration,
    start_delay: Duration,
    state: PollerState,
    ticks: u64,
    samples: u64,
    latest: Option<Reading>,
    last_error: Option<SampleError>,
    diagnostic: Option<String>,
    frames: watch::Sender<PaneFrame>,
    links: PollerLinks,
}

impl<S: SampleSource> Poller<S> {
    pub fn new(
        name: impl Into<String>,
        source: S,
        buffer: StreamBuffer,
        interval: Duration,
        links: PollerLinks,
    ) -> Self {
        let name = name.into();
        let (frames, _) = watch::channel(PaneFrame {
            name: name.clone(),
            state: PollerState::Idle,
            grid: buffer.snapshot(),
            latest: None,
            diagnostic: None,
            last_error: None,
            samples: 0,
        });
        Self {
            name,
            source,
            buffer,
            interval,
            start_delay: Duration::ZERO,
            state: PollerState::Idle,
            ticks: 0,
            samples: 0,
            latest: None,
            last_error: None,
            diagnostic: None,
            frames,
            links,
        }
    }

    /// Delays the first sample, spreading out pollers that spawn processes.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let frames = self.frames.subscribe();
        let name = self.name.clone();
        let task = tokio::spawn(self.run(shutdown_rx));
        PollerHandle {
            name,
            shutdown: shutdown_tx,
            frames,
            task,
        }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> PollerReport {
        if self.source.requires_probe() {
            self.transition(PollerState::Probing);
            let mut retry = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            retry.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let probe = tokio::select! {
                    biased;
                    _ = cancelled(&mut shutdown) => return self.finish(StopReason::Cancelled),
                    probe = self.source.probe() => probe,
                };
                match probe {
                    Ok(()) => break,
                    Err(err) if err.is_fatal() => {
                        self.fail(err);
                        return self.finish(StopReason::Failed);
                    }
                    Err(err) => {
                        warn!(pane = %self.name, error = %err, "probe failed, retrying");
                        self.last_error = Some(err);
                        self.publish();
                    }
                }
                tokio::select! {
                    biased;
                    _ = cancelled(&mut shutdown) => return self.finish(StopReason::Cancelled),
                    _ = retry.tick() => {}
                }
            }
            self.last_error = None;
        }

        self.transition(PollerState::Running);
        // first sample one interval after the start delay
        let first = Instant::now() + self.start_delay + self.interval;
        let mut ticker = tokio::time::interval_at(first, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }
            let result = tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => break,
                result = self.source.sample() => result,
            };
            self.ticks += 1;

            match result {
                Ok(sample) => {
                    self.buffer.push(sample.plot);
                    self.samples += 1;
                    self.latest = Some(sample.reading);
                    self.last_error = None;
                    self.publish();
                }
                Err(err) if err.is_fatal() => {
                    self.fail(err);
                    return self.finish(StopReason::Failed);
                }
                Err(err) => {
                    warn!(pane = %self.name, tick = self.ticks, error = %err, "sample failed");
                    self.last_error = Some(err);
                    self.publish();
                }
            }
        }

        self.finish(StopReason::Cancelled)
    }

    fn transition(&mut self, state: PollerState) {
        debug!(pane = %self.name, from = %self.state, to = %state, "poller state");
        self.state = state;
        self.publish();
    }

    fn fail(&mut self, err: SampleError) {
        let message = err.diagnostic();
        warn!(pane = %self.name, error = %err, "poller stopped");
        let _ = self.links.diagnostics.send(Diagnostic {
            pane: self.name.clone(),
            message: message.clone(),
        });
        self.diagnostic = Some(message);
        self.last_error = Some(err);
        self.transition(PollerState::Stopped);
    }

    fn finish(mut self, stop: StopReason) -> PollerReport {
        if self.state != PollerState::Stopped {
            self.transition(PollerState::Stopped);
        }
        info!(pane = %self.name, ticks = self.ticks, ?stop, "poller finished");
        PollerReport {
            name: self.name,
            state: self.state,
            stop,
            ticks: self.ticks,
            last_error: self.last_error,
            buffer: self.buffer,
        }
    }

    fn publish(&self) {
        self.frames.send_replace(PaneFrame {
            name: self.name.clone(),
            state: self.state,
            grid: self.buffer.snapshot(),
            latest: self.latest.clone(),
            diagnostic: self.diagnostic.clone(),
            last_error: self.last_error.as_ref().map(SampleError::to_string),
            samples: self.samples,
        });
        self.links.redraw.notify_one();
    }
}

/// Resolves once the owner asks for shutdown or drops its handle.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Owner's side of a running poller.
pub struct PollerHandle {
    name: String,
    shutdown: watch::Sender<bool>,
    frames: watch::Receiver<PaneFrame>,
    task: JoinHandle<PollerReport>,
}

impl PollerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> PaneFrame {
        self.frames.borrow().clone()
    }

    pub fn state(&self) -> PollerState {
        self.frames.borrow().state
    }

    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the poller and waits for its task to end.
    pub async fn shutdown(self) -> Result<PollerReport, JoinError> {
        self.cancel();
        self.task.await
    }
}
