//! Stream state machine.
//!
//! ```text
//! Idle      ──Start──────▶ Streaming   create_stream()
//! Streaming ──AudioChunk─▶ Streaming   feed(decoded samples)
//! Streaming ──Finish─────▶ Idle        finish_stream() → TranscriptReady
//! Idle      ──AudioChunk─▶ Idle        dropped
//! Idle      ──Finish─────▶ Idle        no-op, no notification
//! Streaming ──Start──────▶ Streaming   rejected, current stream continues
//! any engine failure     ▶ Idle        StreamFailed
//! ```
//!
//! [`WorkerState`] owns the engine's stream value, so "at most one open
//! stream" holds by construction.

use std::time::Instant;

use crate::audio::Pcm16Decoder;

// ---------------------------------------------------------------------------
// ActiveStream
// ---------------------------------------------------------------------------

/// Bookkeeping for the one open engine stream.
#[derive(Debug)]
pub struct ActiveStream<S> {
    pub id: u64,
    pub handle: S,
    pub decoder: Pcm16Decoder,
    pub chunks_fed: usize,
    pub samples_fed: usize,
    pub opened_at: Instant,
}

impl<S> ActiveStream<S> {
    pub fn new(id: u64, handle: S) -> Self {
        Self {
            id,
            handle,
            decoder: Pcm16Decoder::new(),
            chunks_fed: 0,
            samples_fed: 0,
            opened_at: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerState
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum WorkerState<S> {
    /// No stream open.
    Idle,
    /// Exactly one stream open.
    Streaming(ActiveStream<S>),
}

impl<S> WorkerState<S> {
    pub fn is_streaming(&self) -> bool {
        matches!(self, WorkerState::Streaming(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkerState::Idle => "Idle",
            WorkerState::Streaming(_) => "Streaming",
        }
    }
}

impl<S> Default for WorkerState<S> {
    fn default() -> Self {
        WorkerState::Idle
    }
}

// ---------------------------------------------------------------------------
// WorkerStats
// ---------------------------------------------------------------------------

/// Counters reported when the worker thread exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub commands_processed: u64,
    /// Commands left in the queue by an immediate shutdown.
    pub commands_discarded: u64,
    pub streams_completed: u64,
    pub streams_failed: u64,
    /// Audio chunks that arrived with no stream open.
    pub chunks_dropped: u64,
    /// `Start` commands rejected because a stream was already open.
    pub starts_rejected: u64,
    /// `Finish` commands that arrived with no stream open.
    pub finishes_ignored: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        let state: WorkerState<()> = WorkerState::default();
        assert!(!state.is_streaming());
        assert_eq!(state.label(), "Idle");
    }

    #[test]
    fn streaming_state_exposes_id() {
        let state = WorkerState::Streaming(ActiveStream::new(3, "handle"));
        assert!(state.is_streaming());
        assert!(matches!(&state, WorkerState::Streaming(active) if active.id == 3));
        assert_eq!(state.label(), "Streaming");
    }

    #[test]
    fn new_stream_starts_with_zero_counters() {
        let active = ActiveStream::new(1, ());
        assert_eq!(active.chunks_fed, 0);
        assert_eq!(active.samples_fed, 0);
        assert!(!active.decoder.has_pending());
    }
}
