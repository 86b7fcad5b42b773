//! Speech engine adapter.
//!
//! # Architecture
//!
//! ```text
//! EngineConfig ──validate──▶ WhisperEngine::load ──▶ impl SpeechEngine
//!                                                     ├─ create_stream()
//!                                                     ├─ feed(stream, &[i16])
//!                                                     └─ finish_stream(stream) → String
//! ```
//!
//! The inference worker is generic over [`SpeechEngine`]; tests drive it with
//! a scripted engine instead of a real model.

pub mod adapter;
pub mod alphabet;
pub mod params;
pub mod whisper;

#[cfg(test)]
pub mod mock;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use adapter::{EngineError, SpeechEngine};
pub use alphabet::Alphabet;
pub use params::{
    EngineConfig, LanguageModelConfig, DEFAULT_BEAM_WIDTH, DEFAULT_LM_ALPHA, DEFAULT_LM_BETA,
    DEFAULT_N_CONTEXT, DEFAULT_N_FEATURES,
};
pub use whisper::{WhisperEngine, WhisperStream};
