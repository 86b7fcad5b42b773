//! Microphone capture via `cpal`.
//!
//! [`AudioCapture::new`] opens the default input device and refuses to
//! continue unless the device can deliver the fixed wire format (mono,
//! 16 kHz, signed 16-bit).  [`AudioCapture::start`] then forwards every
//! hardware buffer as little-endian bytes to a caller-supplied sink.  The
//! returned [`StreamHandle`] is a RAII guard; dropping it stops capture.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use thiserror::Error;

use super::pcm::{samples_to_le_bytes, CHANNELS, SAMPLE_RATE};

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {device:?} cannot record 16 kHz 16-bit signed mono PCM")]
    UnsupportedFormat { device: String },

    #[error("failed to query supported input configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Default-input-device capture locked to the 16 kHz / i16 / mono format.
///
/// ```rust,no_run
/// use live_stt::audio::AudioCapture;
///
/// let capture = AudioCapture::new().expect("unsupported device");
/// let _handle = capture.start(|bytes| println!("{} bytes", bytes.len())).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    device_name: String,
}

impl AudioCapture {
    /// Open the system default input device.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] without an input device;
    /// [`CaptureError::UnsupportedFormat`] when none of the device's
    /// supported configurations covers the required format.
    pub fn new() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".into());

        let supported = device
            .supported_input_configs()?
            .find(|range| {
                is_required_format(
                    range.channels(),
                    range.sample_format(),
                    range.min_sample_rate().0,
                    range.max_sample_rate().0,
                )
            })
            .ok_or_else(|| CaptureError::UnsupportedFormat {
                device: device_name.clone(),
            })?;

        let config = supported
            .with_sample_rate(cpal::SampleRate(SAMPLE_RATE))
            .config();

        log::info!("capture: using {device_name:?} at {SAMPLE_RATE} Hz mono i16");

        Ok(Self {
            device,
            config,
            device_name,
        })
    }

    /// Start recording; `sink` receives each hardware buffer as LE bytes.
    ///
    /// The sink runs on cpal's audio thread and must not block.
    pub fn start<F>(&self, mut sink: F) -> Result<StreamHandle, CaptureError>
    where
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                sink(samples_to_le_bytes(data));
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

// ---------------------------------------------------------------------------
// AudioSource
// ---------------------------------------------------------------------------

/// Anything the UI can start recording from.  Dropping the returned handle
/// stops delivery to the sink.
pub trait AudioSource {
    type Handle;

    fn start_capture(&self, sink: Box<dyn FnMut(Vec<u8>) + Send>) -> Result<Self::Handle, CaptureError>;
}

impl AudioSource for AudioCapture {
    type Handle = StreamHandle;

    fn start_capture(&self, sink: Box<dyn FnMut(Vec<u8>) + Send>) -> Result<StreamHandle, CaptureError> {
        self.start(sink)
    }
}

/// `true` when a supported-config range can deliver the wire format.
fn is_required_format(channels: u16, format: SampleFormat, min_rate: u32, max_rate: u32) -> bool {
    channels == CHANNELS && format == SampleFormat::I16 && (min_rate..=max_rate).contains(&SAMPLE_RATE)
}
