//! Notifications from the worker back to the UI context.
//!
//! The worker never touches producer-side state.  It sends [`WorkerEvent`]s
//! over an unbounded `tokio::sync::mpsc` channel and then calls an optional
//! wake hook so an event loop (egui, for instance) schedules a frame; the UI
//! drains the channel on its own thread.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::SAMPLE_RATE;
use crate::engine::EngineError;

// ---------------------------------------------------------------------------
// Transcript / WorkerEvent
// ---------------------------------------------------------------------------

/// Result of one completed stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Sequence number of the stream, starting at 1.
    pub stream_id: u64,
    pub text: String,
    /// 16 kHz samples fed to the engine during the stream.
    pub samples: usize,
    /// Wall time spent in the final decoding call.
    pub decode_time: Duration,
}

impl Transcript {
    /// Seconds of audio in the stream.
    pub fn audio_secs(&self) -> f32 {
        self.samples as f32 / SAMPLE_RATE as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A stream finished and produced a transcript.
    TranscriptReady(Transcript),
    /// An engine call failed; the stream was abandoned.
    StreamFailed { stream_id: u64, error: EngineError },
}

// ---------------------------------------------------------------------------
// Channel ends
// ---------------------------------------------------------------------------

type WakeFn = Box<dyn Fn() + Send + Sync>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let wake = Arc::new(OnceLock::new());
    (
        EventSender {
            tx,
            wake: Arc::clone(&wake),
        },
        EventReceiver { rx, wake },
    )
}

/// Worker end.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<WorkerEvent>,
    wake: Arc<OnceLock<WakeFn>>,
}

impl EventSender {
    pub fn send(&self, event: WorkerEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("events: receiver dropped, notification discarded");
            return;
        }
        if let Some(wake) = self.wake.get() {
            wake();
        }
    }
}

/// UI end.
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<WorkerEvent>,
    wake: Arc<OnceLock<WakeFn>>,
}

impl EventReceiver {
    /// Install the hook run after every event is sent.  Only the first call
    /// takes effect.
    pub fn set_waker(&self, wake: impl Fn() + Send + Sync + 'static) {
        if self.wake.set(Box::new(wake)).is_err() {
            log::warn!("events: waker already installed");
        }
    }

    /// Non-blocking: next pending event, if any.
    pub fn try_next(&mut self) -> Option<WorkerEvent> {
        self.rx.try_recv().ok()
    }

    /// Hand every pending event to `handler` on the calling thread.
    /// Returns the number dispatched.
    pub fn dispatch(&mut self, mut handler: impl FnMut(WorkerEvent)) -> usize {
        let mut n = 0;
        while let Some(event) = self.try_next() {
            handler(event);
            n += 1;
        }
        n
    }

    /// Wait for the next event; `None` once the worker has exited and the
    /// channel is drained.
    pub async fn next(&mut self) -> Option<WorkerEvent> {
        self.rx.recv().await
    }

    /// Blocking variant of [`next`](Self::next).  Must not be called from
    /// inside an async runtime.
    pub fn blocking_next(&mut self) -> Option<WorkerEvent> {
        self.rx.blocking_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transcript(id: u64, text: &str) -> WorkerEvent {
        WorkerEvent::TranscriptReady(Transcript {
            stream_id: id,
            text: text.into(),
            samples: 16_000,
            decode_time: Duration::from_millis(5),
        })
    }

    #[test]
    fn dispatch_delivers_in_send_order() {
        let (tx, mut rx) = event_channel();
        tx.send(transcript(1, "one"));
        tx.send(transcript(2, "two"));

        let mut seen = Vec::new();
        assert_eq!(rx.dispatch(|e| seen.push(e)), 2);
        assert_eq!(seen, vec![transcript(1, "one"), transcript(2, "two")]);
        assert_eq!(rx.dispatch(|_| panic!("no more events")), 0);
    }

    #[test]
    fn waker_runs_once_per_event() {
        let (tx, rx) = event_channel();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        rx.set_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tx.send(transcript(1, "a"));
        tx.send(transcript(2, "b"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn send_after_receiver_dropped_is_silent() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.send(transcript(1, "lost"));
    }

    #[test]
    fn audio_secs_uses_sample_rate() {
        let t = Transcript {
            stream_id: 1,
            text: String::new(),
            samples: 8_000,
            decode_time: Duration::ZERO,
        };
        assert!((t.audio_secs() - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn next_returns_none_after_sender_dropped() {
        let (tx, mut rx) = event_channel();
        tx.send(transcript(7, "last"));
        drop(tx);

        assert_eq!(rx.next().await, Some(transcript(7, "last")));
        assert_eq!(rx.next().await, None);
    }
}
