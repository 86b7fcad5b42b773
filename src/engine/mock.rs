//! Scripted [`SpeechEngine`] test double.
//!
//! Records every call into a shared [`CallLog`] and derives the transcript
//! deterministically from the exact sequence of fed chunks, so tests can
//! assert on ordering and on what never reached the engine.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};

use super::adapter::{EngineError, SpeechEngine};

/// One observed engine call.  Stream ids start at 1.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreateStream(u64),
    Feed(u64, Vec<i16>),
    Finish(u64),
}

/// Shared, cloneable record of engine calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().unwrap().clone()
    }

    /// Chunks fed to `stream_id`, in order.
    pub fn fed(&self, stream_id: u64) -> Vec<Vec<i16>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Feed(id, samples) if id == stream_id => Some(samples),
                _ => None,
            })
            .collect()
    }

    pub fn feed_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Feed(..)))
            .count()
    }

    fn push(&self, call: EngineCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Lets a test hold the worker inside `feed` until released.
///
/// The engine signals `entered` on every feed and then waits on `release`;
/// dropping the release sender lets every later feed pass straight through.
pub struct FeedGate {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

struct GateEnds {
    entered: Sender<()>,
    release: Receiver<()>,
}

pub struct ScriptedStream {
    id: u64,
    chunks: Vec<Vec<i16>>,
}

type Decoder = Box<dyn Fn(&[Vec<i16>]) -> String + Send>;

pub struct ScriptedEngine {
    log: CallLog,
    next_id: u64,
    decoder: Decoder,
    fail_feed_on_stream: Option<u64>,
    fail_finish_on_stream: Option<u64>,
    fail_create: bool,
    gate: Option<GateEnds>,
}

impl ScriptedEngine {
    /// Engine using [`token_decoder`].
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            next_id: 1,
            decoder: Box::new(token_decoder),
            fail_feed_on_stream: None,
            fail_finish_on_stream: None,
            fail_create: false,
            gate: None,
        }
    }

    pub fn with_decoder(mut self, decoder: impl Fn(&[Vec<i16>]) -> String + Send + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Every `feed` on stream `stream_id` fails.
    pub fn failing_feed_on_stream(mut self, stream_id: u64) -> Self {
        self.fail_feed_on_stream = Some(stream_id);
        self
    }

    /// `finish_stream` on stream `stream_id` fails after logging the call.
    pub fn failing_finish_on_stream(mut self, stream_id: u64) -> Self {
        self.fail_finish_on_stream = Some(stream_id);
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn gated(mut self) -> (Self, FeedGate) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        self.gate = Some(GateEnds {
            entered: entered_tx,
            release: release_rx,
        });
        (
            self,
            FeedGate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl SpeechEngine for ScriptedEngine {
    type Stream = ScriptedStream;

    fn create_stream(&mut self) -> Result<Self::Stream, EngineError> {
        if self.fail_create {
            return Err(EngineError::Stream("create rejected".into()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.log.push(EngineCall::CreateStream(id));
        Ok(ScriptedStream {
            id,
            chunks: Vec::new(),
        })
    }

    fn feed(&mut self, stream: &mut Self::Stream, samples: &[i16]) -> Result<(), EngineError> {
        if let Some(gate) = &self.gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }
        self.log.push(EngineCall::Feed(stream.id, samples.to_vec()));
        if self.fail_feed_on_stream == Some(stream.id) {
            return Err(EngineError::Stream(format!("feed rejected on stream {}", stream.id)));
        }
        stream.chunks.push(samples.to_vec());
        Ok(())
    }

    fn finish_stream(&mut self, stream: Self::Stream) -> Result<String, EngineError> {
        self.log.push(EngineCall::Finish(stream.id));
        if self.fail_finish_on_stream == Some(stream.id) {
            return Err(EngineError::Transcription(format!(
                "decode rejected on stream {}",
                stream.id
            )));
        }
        Ok((self.decoder)(&stream.chunks))
    }
}

/// Maps each chunk to a token by its first sample: `1` → `"hel"`, `2` →
/// `"lo"`, anything else (silence included) → nothing.  Tokens are joined
/// without separators.
pub fn token_decoder(chunks: &[Vec<i16>]) -> String {
    chunks
        .iter()
        .filter_map(|chunk| match chunk.first() {
            Some(1) => Some("hel"),
            Some(2) => Some("lo"),
            _ => None,
        })
        .collect()
}

/// Little-endian bytes for `samples`, as a capture device would deliver them.
pub fn le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
