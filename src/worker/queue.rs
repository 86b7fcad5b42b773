//! Command queue between producers and the inference worker.
//!
//! An unbounded multi-producer, single-consumer FIFO built on
//! `crossbeam_channel`.  [`CommandSender::push`] never blocks and never fails;
//! the one [`CommandReceiver`] is owned by the worker thread.
//!
//! The worker loop does not call [`CommandReceiver::pop`]: it selects on the
//! underlying channel together with its shutdown channel, so a shutdown
//! request wakes it without waiting out a timeout.  `pop` and `try_pop` are
//! the consumer API for callers that wait on the queue alone; the worker
//! uses `try_pop` to drain on shutdown.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Work items processed by the inference worker, strictly in enqueue order.
#[derive(Clone, PartialEq)]
pub enum Command {
    /// Open a new engine stream.
    Start,
    /// Little-endian 16-bit PCM for the open stream.
    AudioChunk(Vec<u8>),
    /// Close the stream and emit its transcript.
    Finish,
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::Start => "Start",
            Command::AudioChunk(_) => "AudioChunk",
            Command::Finish => "Finish",
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::AudioChunk(bytes) => write!(f, "AudioChunk({} bytes)", bytes.len()),
            other => f.write_str(other.label()),
        }
    }
}

// ---------------------------------------------------------------------------
// PopError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    #[error("no command arrived before the timeout")]
    Timeout,
    #[error("every command sender has been dropped")]
    Disconnected,
}

// ---------------------------------------------------------------------------
// Queue ends
// ---------------------------------------------------------------------------

/// Create a connected sender/receiver pair.
pub fn command_queue() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Producer end.  Cheap to clone; safe to use from any thread, including
/// audio callbacks.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Enqueue `command`.  If the worker has already exited the command is
    /// discarded.
    pub fn push(&self, command: Command) {
        if let Err(e) = self.tx.send(command) {
            log::debug!("queue: worker gone, discarding {:?}", e.into_inner());
        }
    }

    /// Commands waiting to be consumed.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer end, owned by the worker.
pub struct CommandReceiver {
    rx: Receiver<Command>,
}

impl CommandReceiver {
    /// Wait up to `timeout` for the next command.  For consumers that have
    /// no other channel to watch.
    pub fn pop(&self, timeout: Duration) -> Result<Command, PopError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PopError::Timeout,
            RecvTimeoutError::Disconnected => PopError::Disconnected,
        })
    }

    /// Next command if one is already queued.
    pub fn try_pop(&self) -> Option<Command> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Underlying channel, for `select!` in the worker loop.
    pub(crate) fn channel(&self) -> &Receiver<Command> {
        &self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn pop_returns_commands_in_push_order() {
        let (tx, rx) = command_queue();
        tx.push(Command::Start);
        tx.push(Command::AudioChunk(vec![1, 2]));
        tx.push(Command::Finish);

        let timeout = Duration::from_millis(10);
        assert_eq!(rx.pop(timeout), Ok(Command::Start));
        assert_eq!(rx.pop(timeout), Ok(Command::AudioChunk(vec![1, 2])));
        assert_eq!(rx.pop(timeout), Ok(Command::Finish));
    }

    #[test]
    fn pop_times_out_on_empty_queue() {
        let (_tx, rx) = command_queue();
        let started = Instant::now();
        assert_eq!(rx.pop(Duration::from_millis(30)), Err(PopError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn pop_reports_disconnect_after_queue_drained() {
        let (tx, rx) = command_queue();
        tx.push(Command::Finish);
        drop(tx);

        assert_eq!(rx.pop(Duration::from_millis(10)), Ok(Command::Finish));
        assert_eq!(rx.pop(Duration::from_millis(10)), Err(PopError::Disconnected));
    }

    #[test]
    fn push_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = command_queue();
        drop(rx);
        tx.push(Command::Start);
    }

    #[test]
    fn concurrent_producers_preserve_per_producer_order() {
        let (tx, rx) = command_queue();
        let producers: Vec<_> = (0u8..4)
            .map(|p| {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    for i in 0u8..50 {
                        tx.push(Command::AudioChunk(vec![p, i]));
                    }
                })
            })
            .collect();
        for handle in producers {
            handle.join().unwrap();
        }

        let mut last = [None::<u8>; 4];
        let mut total = 0;
        while let Some(cmd) = rx.try_pop() {
            let Command::AudioChunk(bytes) = cmd else {
                panic!("unexpected {cmd:?}");
            };
            let (p, i) = (bytes[0] as usize, bytes[1]);
            assert!(last[p].map_or(true, |prev| prev < i));
            last[p] = Some(i);
            total += 1;
        }
        assert_eq!(total, 200);
    }

    #[test]
    fn debug_hides_chunk_payload() {
        assert_eq!(format!("{:?}", Command::AudioChunk(vec![0; 640])), "AudioChunk(640 bytes)");
        assert_eq!(format!("{:?}", Command::Start), "Start");
    }
}
