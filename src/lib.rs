//! Live microphone speech-to-text.
//!
//! Audio captured on the device thread and Start/Stop requests from the UI are
//! serialised through a command queue onto one inference thread that owns
//! the speech engine.  Transcripts travel back to the UI over an event
//! channel.

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod engine;
pub mod worker;
