//! Inference worker. Serialises all engine access on one thread.
//!
//! # Architecture
//!
//! ```text
//! UI thread ──request_start──┐
//! audio callback ─submit_audio┼─▶ CommandQueue ─▶ inference-worker thread
//! UI thread ──request_stop───┘                     │  WorkerState::{Idle, Streaming}
//!                                                  │  SpeechEngine calls
//!                                                  ▼
//! UI thread ◀── poll_events ◀── WorkerEvent channel (+ waker)
//! ```
//!
//! Producers never block and never touch the engine.  The engine is built
//! and used on the worker thread only.

pub mod controller;
pub mod events;
pub mod queue;
pub mod runner;
pub mod state;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use controller::Controller;
pub use events::{event_channel, EventReceiver, EventSender, Transcript, WorkerEvent};
pub use queue::{command_queue, Command, CommandReceiver, CommandSender, PopError};
pub use runner::{InferenceWorker, ShutdownPolicy, WorkerError, WorkerHandle, WorkerOptions};
pub use state::{ActiveStream, WorkerState, WorkerStats};
