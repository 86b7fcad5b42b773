//! Inference worker thread: one engine and one command loop.
//!
//! [`InferenceWorker::spawn`] starts a dedicated thread, builds the engine on
//! it and reports construction failures back to the caller before returning.
//! The thread then blocks on a `select!` over the command queue and a
//! dedicated shutdown channel:
//!
//! ```text
//! ┌──────────── loop ─────────────┐
//! │ shutdown signalled? ──yes──▶ ShutdownPolicy::{Drain, Immediate} ─▶ exit
//! │ select! {                      │
//! │   command   → apply(command)   │
//! │   shutdown  → (as above)       │
//! │   heartbeat → trace log        │
//! │ }                              │
//! └────────────────────────────────┘
//! ```
//!
//! Shutdown is observed only between commands: an in-flight `feed` or
//! `finish_stream` always runs to completion.  There is no deadline on engine
//! calls, so an engine that hangs also hangs [`WorkerHandle::join`].

use std::str::FromStr;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineError, SpeechEngine};

use super::controller::Controller;
use super::events::{event_channel, EventSender, Transcript, WorkerEvent};
use super::queue::{command_queue, Command, CommandReceiver};
use super::state::{ActiveStream, WorkerState, WorkerStats};

// ---------------------------------------------------------------------------
// ShutdownPolicy / WorkerOptions
// ---------------------------------------------------------------------------

/// What the worker does with queued commands once shutdown is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Process everything already queued, then exit.
    #[default]
    Drain,
    /// Exit at once; queued commands and any open stream are discarded.
    Immediate,
}

impl FromStr for ShutdownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drain" => Ok(Self::Drain),
            "immediate" => Ok(Self::Immediate),
            other => Err(format!("unknown shutdown policy {other:?} (expected drain|immediate)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub shutdown_policy: ShutdownPolicy,
    /// Idle interval between trace-level heartbeat logs.
    pub heartbeat: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            shutdown_policy: ShutdownPolicy::Drain,
            heartbeat: Duration::from_millis(300),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("engine construction failed: {0}")]
    Engine(#[from] EngineError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker thread panicked")]
    Panicked,
}

// ---------------------------------------------------------------------------
// WorkerHandle
// ---------------------------------------------------------------------------

/// Owner-side handle for the worker thread.
///
/// Dropping the handle requests shutdown without waiting for the thread.
pub struct WorkerHandle {
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<WorkerStats>>,
}

impl WorkerHandle {
    /// Signal the worker to stop.  Returns immediately.
    pub fn request_shutdown(&mut self) {
        if self.shutdown_tx.take().is_some() {
            log::debug!("worker: shutdown requested");
        }
    }

    /// Wait for the thread to exit.
    pub fn join(mut self) -> Result<WorkerStats, WorkerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WorkerError::Panicked),
            None => Ok(WorkerStats::default()),
        }
    }

    /// [`request_shutdown`](Self::request_shutdown) then [`join`](Self::join).
    pub fn shutdown(mut self) -> Result<WorkerStats, WorkerError> {
        self.request_shutdown();
        self.join()
    }
}

// ---------------------------------------------------------------------------
// InferenceWorker
// ---------------------------------------------------------------------------

/// The stream state machine plus the engine it drives.
pub struct InferenceWorker<E: SpeechEngine> {
    engine: E,
    state: WorkerState<E::Stream>,
    events: EventSender,
    next_stream_id: u64,
    stats: WorkerStats,
}

impl<E: SpeechEngine + 'static> InferenceWorker<E> {
    /// Start the worker thread and build the engine on it with `factory`.
    ///
    /// Blocks until the engine is ready.  Returns the producer-side
    /// [`Controller`] and the thread's [`WorkerHandle`].
    ///
    /// # Errors
    ///
    /// [`WorkerError::Engine`] if `factory` fails; the thread has already
    /// exited and nothing was queued.
    pub fn spawn<F>(factory: F, options: WorkerOptions) -> Result<(Controller, WorkerHandle), WorkerError>
    where
        F: FnOnce() -> Result<E, EngineError> + Send + 'static,
    {
        let (command_tx, command_rx) = command_queue();
        let (event_tx, event_rx) = event_channel();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), EngineError>>(1);

        let thread = std::thread::Builder::new()
            .name("inference-worker".into())
            .spawn(move || {
                let engine = match factory() {
                    Ok(engine) => engine,
                    Err(e) => {
                        log::error!("worker: engine construction failed: {e}");
                        let _ = ready_tx.send(Err(e));
                        return WorkerStats::default();
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let mut worker = InferenceWorker::new(engine, event_tx);
                worker.run(&command_rx, &shutdown_rx, &options);
                worker.stats
            })
            .map_err(WorkerError::Spawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(WorkerError::Engine(e));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(WorkerError::Panicked);
            }
        }

        Ok((
            Controller::new(command_tx, event_rx),
            WorkerHandle {
                shutdown_tx: Some(shutdown_tx),
                thread: Some(thread),
            },
        ))
    }
}

impl<E: SpeechEngine> InferenceWorker<E> {
    pub(crate) fn new(engine: E, events: EventSender) -> Self {
        Self {
            engine,
            state: WorkerState::Idle,
            events,
            next_stream_id: 1,
            stats: WorkerStats::default(),
        }
    }

    pub fn state(&self) -> &WorkerState<E::Stream> {
        &self.state
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    fn run(&mut self, commands: &CommandReceiver, shutdown: &Receiver<()>, options: &WorkerOptions) {
        log::info!("worker: started ({:?} on shutdown)", options.shutdown_policy);

        loop {
            if shutdown_signalled(shutdown) {
                self.shut_down(commands, options.shutdown_policy);
                break;
            }

            crossbeam_channel::select! {
                recv(commands.channel()) -> msg => match msg {
                    Ok(command) => self.apply(command),
                    Err(_) => {
                        log::info!("worker: every producer dropped");
                        break;
                    }
                },
                recv(shutdown) -> _ => {
                    self.shut_down(commands, options.shutdown_policy);
                    break;
                }
                default(options.heartbeat) => {
                    log::trace!(
                        "worker: idle heartbeat (state {}, {} queued)",
                        self.state.label(),
                        commands.len()
                    );
                }
            }
        }

        if let WorkerState::Streaming(active) = std::mem::take(&mut self.state) {
            log::warn!(
                "worker: exiting with stream {} open; {} chunks discarded without a transcript",
                active.id,
                active.chunks_fed
            );
        }
        log::info!("worker: stopped ({:?})", self.stats);
    }

    fn shut_down(&mut self, commands: &CommandReceiver, policy: ShutdownPolicy) {
        match policy {
            ShutdownPolicy::Drain => {
                let mut drained = 0usize;
                while let Some(command) = commands.try_pop() {
                    self.apply(command);
                    drained += 1;
                }
                log::info!("worker: shutdown, drained {drained} queued commands");
            }
            ShutdownPolicy::Immediate => {
                let mut discarded = 0u64;
                while commands.try_pop().is_some() {
                    discarded += 1;
                }
                self.stats.commands_discarded += discarded;
                log::info!("worker: immediate shutdown, discarded {discarded} queued commands");
            }
        }
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    /// Apply one command to the state machine.
    pub(crate) fn apply(&mut self, command: Command) {
        self.stats.commands_processed += 1;

        self.state = match (std::mem::take(&mut self.state), command) {
            (WorkerState::Idle, Command::Start) => self.open_stream(),

            (WorkerState::Streaming(active), Command::Start) => {
                log::warn!("worker: Start while stream {} is open; ignored", active.id);
                self.stats.starts_rejected += 1;
                WorkerState::Streaming(active)
            }

            (WorkerState::Streaming(active), Command::AudioChunk(bytes)) => self.feed(active, &bytes),

            (WorkerState::Idle, Command::AudioChunk(bytes)) => {
                log::debug!("worker: no open stream, dropping {} bytes", bytes.len());
                self.stats.chunks_dropped += 1;
                WorkerState::Idle
            }

            (WorkerState::Streaming(active), Command::Finish) => self.finish(active),

            (WorkerState::Idle, Command::Finish) => {
                log::debug!("worker: Finish with no open stream; ignored");
                self.stats.finishes_ignored += 1;
                WorkerState::Idle
            }
        };
    }

    fn open_stream(&mut self) -> WorkerState<E::Stream> {
        let id = self.next_stream_id;
        self.next_stream_id += 1;

        match self.engine.create_stream() {
            Ok(handle) => {
                log::debug!("worker: stream {id} opened");
                WorkerState::Streaming(ActiveStream::new(id, handle))
            }
            Err(e) => {
                self.fail(id, e);
                WorkerState::Idle
            }
        }
    }

    fn feed(&mut self, mut active: ActiveStream<E::Stream>, bytes: &[u8]) -> WorkerState<E::Stream> {
        let samples = active.decoder.decode(bytes);
        if samples.is_empty() {
            return WorkerState::Streaming(active);
        }

        match self.engine.feed(&mut active.handle, &samples) {
            Ok(()) => {
                active.chunks_fed += 1;
                active.samples_fed += samples.len();
                WorkerState::Streaming(active)
            }
            Err(e) => {
                self.fail(active.id, e);
                WorkerState::Idle
            }
        }
    }

    fn finish(&mut self, active: ActiveStream<E::Stream>) -> WorkerState<E::Stream> {
        if active.decoder.has_pending() {
            log::warn!("worker: stream {} ended on half a sample; byte discarded", active.id);
        }

        let ActiveStream {
            id,
            handle,
            samples_fed,
            opened_at,
            ..
        } = active;

        let started = Instant::now();
        match self.engine.finish_stream(handle) {
            Ok(text) => {
                let transcript = Transcript {
                    stream_id: id,
                    text,
                    samples: samples_fed,
                    decode_time: started.elapsed(),
                };
                log::debug!(
                    "worker: stream {id} finished ({:.2} s audio, open {} ms): {:?}",
                    transcript.audio_secs(),
                    opened_at.elapsed().as_millis(),
                    transcript.text
                );
                self.stats.streams_completed += 1;
                self.events.send(WorkerEvent::TranscriptReady(transcript));
            }
            Err(e) => self.fail(id, e),
        }
        WorkerState::Idle
    }

    fn fail(&mut self, stream_id: u64, error: EngineError) {
        log::error!("worker: stream {stream_id} failed: {error}");
        self.stats.streams_failed += 1;
        self.events.send(WorkerEvent::StreamFailed { stream_id, error });
    }
}

/// `true` once the shutdown sender has signalled or been dropped.
fn shutdown_signalled(shutdown: &Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
