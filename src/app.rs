//! Live transcription window (egui/eframe application).
//!
//! # Architecture
//!
//! [`SpeechApp`] is the top-level [`eframe::App`].  It owns the producer side
//! of the inference worker (a [`Controller`]) and an [`AudioSource`]:
//!
//! * Record → `request_start()`, then capture starts feeding
//!   `Controller::audio_sink` from the audio thread.
//! * Stop → the capture handle is dropped first so no chunk can trail the
//!   `Finish`, then `request_stop()`.
//! * Each frame drains [`WorkerEvent`]s on the UI thread.  The worker's waker
//!   calls `request_repaint`, so an idle window still wakes for a transcript.
//!
//! | State | Visual |
//! |-------|--------|
//! | Idle | "Record" button, last transcript |
//! | Recording | "Stop" button, `...`, elapsed timer |
//! | Error | Orange message under the transcript |

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::audio::AudioSource;
use crate::config::UiConfig;
use crate::worker::{Controller, WorkerEvent};

/// Placeholder shown while audio is being captured.
pub const RECORDING_PLACEHOLDER: &str = "...";

/// Why the app opened a worker stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanOrigin {
    Recorded,
    /// Opened, then closed at once because capture did not start.
    CaptureFailed,
}

// ---------------------------------------------------------------------------
// SpeechApp
// ---------------------------------------------------------------------------

pub struct SpeechApp<A: AudioSource> {
    controller: Controller,
    source: A,
    /// Live capture; `Some` exactly while recording.
    capture: Option<A::Handle>,
    recording_start: Option<Instant>,
    /// Transcript label text.
    label: String,
    error_message: Option<String>,
    /// Streams awaiting their one worker event, oldest first.
    spans: VecDeque<SpanOrigin>,
    transcripts_received: usize,
    config: UiConfig,
}

impl<A: AudioSource> SpeechApp<A> {
    pub fn new(controller: Controller, source: A, config: UiConfig) -> Self {
        Self {
            controller,
            source,
            capture: None,
            recording_start: None,
            label: String::new(),
            error_message: None,
            spans: VecDeque::new(),
            transcripts_received: 0,
            config,
        }
    }

    /// Wake the egui event loop whenever the worker sends a notification.
    pub fn attach(&self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        self.controller.set_waker(move || ctx.request_repaint());
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_some()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    // ── Recording control ────────────────────────────────────────────────

    pub fn toggle_recording(&mut self) {
        if self.is_recording() {
            self.stop_recording();
        } else {
            self.start_recording();
        }
    }

    fn start_recording(&mut self) {
        self.controller.request_start();

        match self.source.start_capture(Box::new(self.controller.audio_sink())) {
            Ok(handle) => {
                log::info!("app: recording started");
                self.spans.push_back(SpanOrigin::Recorded);
                self.capture = Some(handle);
                self.recording_start = Some(Instant::now());
                self.label = RECORDING_PLACEHOLDER.into();
                self.error_message = None;
            }
            Err(e) => {
                log::error!("app: failed to start capture: {e}");
                // Close the stream opened above; its empty transcript is
                // swallowed in `handle_event`.
                self.controller.request_stop();
                self.spans.push_back(SpanOrigin::CaptureFailed);
                self.error_message = Some(format!("Capture failed: {e}"));
            }
        }
    }

    fn stop_recording(&mut self) {
        // Drop the capture before Finish so no chunk lands after it.
        self.capture = None;
        self.controller.request_stop();

        if let Some(start) = self.recording_start.take() {
            log::info!("app: recording stopped after {:.1} s", start.elapsed().as_secs_f32());
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain pending worker notifications.  Returns how many were handled.
    pub fn poll_events(&mut self) -> usize {
        let mut pending = Vec::new();
        let n = self.controller.poll_events(|e| pending.push(e));
        for event in pending {
            self.handle_event(event);
        }
        n
    }

    fn handle_event(&mut self, event: WorkerEvent) {
        if self.spans.pop_front() == Some(SpanOrigin::CaptureFailed) {
            log::debug!("app: ignoring result of aborted recording: {event:?}");
            return;
        }

        match event {
            WorkerEvent::TranscriptReady(transcript) => {
                println!("Transcription: {}", transcript.text);
                log::info!(
                    "app: stream {} transcribed {:.2} s of audio in {} ms",
                    transcript.stream_id,
                    transcript.audio_secs(),
                    transcript.decode_time.as_millis()
                );
                self.transcripts_received += 1;
                // A late transcript must not replace the placeholder of a
                // newer recording.
                if !self.is_recording() {
                    self.label = transcript.text;
                }
            }
            WorkerEvent::StreamFailed { stream_id, error } => {
                log::warn!("app: stream {stream_id} failed: {error}");
                if !self.is_recording() {
                    self.label.clear();
                }
                self.error_message = Some(format!("Transcription failed: {error}"));
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let caption = if self.is_recording() { "Stop" } else { "Record" };
            if ui.add(egui::Button::new(egui::RichText::new(caption).size(14.0))).clicked() {
                self.toggle_recording();
            }

            if let Some(start) = self.recording_start {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!("{:.1}s", start.elapsed().as_secs_f32()))
                            .color(egui::Color32::from_rgb(255, 140, 140))
                            .size(12.0),
                    );
                });
            }
        });
    }

    fn draw_transcript(&self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.label(egui::RichText::new(self.label.as_str()).size(13.0));

        if let Some(msg) = &self.error_message {
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(msg.as_str())
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl<A: AudioSource> eframe::App for SpeechApp<A> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Keep the elapsed timer ticking.
        if self.is_recording() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_controls(ui);
            ui.separator();
            self.draw_transcript(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.is_recording() {
            self.stop_recording();
        }
        log::info!(
            "app: window closing after {} transcripts (always_on_top={})",
            self.transcripts_received,
            self.config.always_on_top
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
