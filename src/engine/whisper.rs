//! Production [`SpeechEngine`] backed by `whisper-rs`.
//!
//! Whisper decodes whole utterances rather than incremental frames, so a
//! [`WhisperStream`] buffers the fed samples and the decoding pass runs in
//! [`finish_stream`](SpeechEngine::finish_stream).  The backend computes its
//! own log-mel features and has no external scorer:
//!
//! | `EngineConfig` field | Whisper mapping                            |
//! |----------------------|--------------------------------------------|
//! | `model_path`         | GGML model loaded into `WhisperContext`    |
//! | `alphabet_path`      | output normalisation via [`Alphabet`]      |
//! | `beam_width`         | `SamplingStrategy::BeamSearch { beam_size }`, capped at 8 |
//! | `language`           | `FullParams::set_language`                 |
//! | `n_features`, `n_context` | validated, unused by this backend     |
//! | `language_model`     | validated, unused by this backend          |

use std::time::Instant;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::adapter::{EngineError, SpeechEngine};
use super::alphabet::Alphabet;
use super::params::EngineConfig;

/// whisper.cpp skips inputs shorter than one second; shorter streams are
/// padded with silence up to this length (1.1 s at 16 kHz).
const MIN_DECODE_SAMPLES: usize = 17_600;

/// whisper.cpp runs one decoder per beam and rejects more than
/// `WHISPER_MAX_DECODERS` (8) of them.
const MAX_BEAM_SIZE: u32 = 8;

// ---------------------------------------------------------------------------
// WhisperStream
// ---------------------------------------------------------------------------

/// Audio buffered for one session.
#[derive(Debug, Default)]
pub struct WhisperStream {
    samples: Vec<f32>,
}

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

pub struct WhisperEngine {
    ctx: WhisperContext,
    alphabet: Alphabet,
    config: EngineConfig,
    beam_size: i32,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("config", &self.config)
            .field("alphabet_len", &self.alphabet.len())
            .finish_non_exhaustive()
    }
}

impl WhisperEngine {
    /// Validate `config`, load the alphabet and the GGML model.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MissingFile`] / [`EngineError::InvalidParameter`] from
    ///   [`EngineConfig::validate`].
    /// - [`EngineError::InvalidAlphabet`] if the alphabet cannot be parsed.
    /// - [`EngineError::ContextInit`] if whisper-rs rejects the model file.
    pub fn load(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let alphabet = Alphabet::load(&config.alphabet_path)?;

        let path_str = config.model_path.to_str().ok_or_else(|| {
            EngineError::ContextInit(format!(
                "model path contains non-UTF-8 characters: {}",
                config.model_path.display()
            ))
        })?;

        if config.language_model.is_some() {
            log::warn!(
                "engine: whisper backend has no external scorer; language model and trie are ignored"
            );
        }
        log::debug!(
            "engine: feature count {} / context window {} are fixed by the whisper front-end",
            config.n_features,
            config.n_context
        );

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| EngineError::ContextInit(e.to_string()))?;

        let beam_size = whisper_beam_size(config.beam_width);
        if beam_size.unsigned_abs() < config.beam_width {
            log::warn!(
                "engine: beam width {} exceeds the whisper limit; decoding with {beam_size} beams",
                config.beam_width
            );
        }

        log::info!(
            "engine: loaded {} (alphabet: {} symbols, beam size {beam_size})",
            config.model_path.display(),
            alphabet.len()
        );

        Ok(Self {
            ctx,
            alphabet,
            config,
            beam_size,
            n_threads: optimal_threads(),
        })
    }

    fn decode(&self, audio: &[f32]) -> Result<String, EngineError> {
        let mut fp = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: self.beam_size,
            patience: -1.0,
        });
        fp.set_language(Some(self.config.language.as_str()));
        fp.set_n_threads(self.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);
        fp.set_print_special(false);
        fp.set_print_timestamps(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| EngineError::ContextInit(e.to_string()))?;

        state
            .full(fp, audio)
            .map_err(|e| EngineError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| EngineError::Transcription(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| EngineError::Transcription(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
            text.push(' ');
        }
        Ok(text)
    }
}

impl SpeechEngine for WhisperEngine {
    type Stream = WhisperStream;

    fn create_stream(&mut self) -> Result<Self::Stream, EngineError> {
        Ok(WhisperStream::default())
    }

    fn feed(&mut self, stream: &mut Self::Stream, samples: &[i16]) -> Result<(), EngineError> {
        stream.samples.extend(samples.iter().map(|&s| pcm16_to_f32(s)));
        Ok(())
    }

    fn finish_stream(&mut self, stream: Self::Stream) -> Result<String, EngineError> {
        let mut audio = stream.samples;
        if audio.is_empty() {
            return Ok(String::new());
        }
        if audio.len() < MIN_DECODE_SAMPLES {
            audio.resize(MIN_DECODE_SAMPLES, 0.0);
        }

        let started = Instant::now();
        let raw = self.decode(&audio)?;
        let text = self.alphabet.normalize(&strip_annotations(&raw));
        log::debug!(
            "engine: decoded {} samples in {} ms",
            audio.len(),
            started.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Map a signed 16-bit sample onto `[-1.0, 1.0)`.
fn pcm16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32_768.0
}

/// Remove bracketed non-speech markers such as `[BLANK_AUDIO]` or `(music)`.
fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Beam count handed to whisper for a configured beam width.
fn whisper_beam_size(beam_width: u32) -> i32 {
    // Both bounds fit in i32.
    beam_width.min(MAX_BEAM_SIZE) as i32
}

/// CPU threads for inference, capped at 8.
fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}
