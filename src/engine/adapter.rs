//! Stream-session interface to the speech recognition engine.
//!
//! The inference worker is the only caller.  It owns the engine for its whole
//! lifetime and drives it from a single thread, so the trait takes `&mut self`
//! and carries no `Send`/`Sync` bounds: the engine is built *on* the worker
//! thread and never leaves it.

use thiserror::Error;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// All errors that can arise from a speech engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A required file (model, alphabet, language model, trie) is missing or
    /// unreadable.
    #[error("{kind} file not readable: {path} ({reason})")]
    MissingFile {
        kind: &'static str,
        path: String,
        reason: String,
    },

    /// The alphabet file parsed to an empty or otherwise unusable symbol set.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    /// A tuning parameter is out of range.
    #[error("invalid engine parameter: {0}")]
    InvalidParameter(String),

    /// The backend failed to load the model.
    #[error("engine initialisation failed: {0}")]
    ContextInit(String),

    /// Opening or feeding a stream failed.
    #[error("stream error: {0}")]
    Stream(String),

    /// The final decoding pass failed.
    #[error("transcription error: {0}")]
    Transcription(String),
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// A stateful streaming recognizer.
///
/// # Contract
///
/// - `samples` passed to [`feed`](Self::feed) are 16 kHz, mono, signed 16-bit
///   PCM, in capture order.
/// - A stream returned by [`create_stream`](Self::create_stream) is consumed by
///   exactly one [`finish_stream`](Self::finish_stream) call, or dropped.
/// - The caller never has more than one stream open at a time.
pub trait SpeechEngine {
    /// Per-session decoding state.  Opaque to the caller.
    type Stream;

    /// Open a new decoding session.
    fn create_stream(&mut self) -> Result<Self::Stream, EngineError>;

    /// Append audio to an open session.
    fn feed(&mut self, stream: &mut Self::Stream, samples: &[i16]) -> Result<(), EngineError>;

    /// Close the session and return its transcript.
    fn finish_stream(&mut self, stream: Self::Stream) -> Result<String, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_display_names_kind_and_path() {
        let e = EngineError::MissingFile {
            kind: "model",
            path: "/models/output_graph.pbmm".into(),
            reason: "No such file or directory".into(),
        };
        let s = e.to_string();
        assert!(s.starts_with("model file"));
        assert!(s.contains("/models/output_graph.pbmm"));
    }

    #[test]
    fn engine_error_is_cloneable_for_notifications() {
        let e = EngineError::Stream("feed rejected".into());
        assert_eq!(e.clone(), e);
    }
}
