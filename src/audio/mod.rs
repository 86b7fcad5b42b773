//! Audio source: microphone capture and the PCM wire format.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback (i16) → samples_to_le_bytes → sink
//!           → Controller::submit_audio → CommandQueue → Pcm16Decoder (worker)
//! ```

pub mod capture;
pub mod pcm;

pub use capture::{AudioCapture, AudioSource, CaptureError, StreamHandle};
pub use pcm::{
    samples_for_millis, samples_to_le_bytes, Pcm16Decoder, BYTES_PER_SAMPLE, CHANNELS,
    SAMPLE_RATE,
};
