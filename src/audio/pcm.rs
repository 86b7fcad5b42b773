//! Conversion between capture bytes and 16-bit samples.
//!
//! The wire format between capture and the inference worker is fixed:
//! mono, 16 kHz, signed 16-bit, little-endian.

/// Required capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16_000;
/// Required capture channel count.
pub const CHANNELS: u16 = 1;
/// Bytes per sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Serialise samples as little-endian bytes.
///
/// ```
/// use live_stt::audio::samples_to_le_bytes;
///
/// assert_eq!(samples_to_le_bytes(&[1, -2]), vec![0x01, 0x00, 0xFE, 0xFF]);
/// ```
pub fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Number of samples needed for `millis` of audio.
pub const fn samples_for_millis(millis: u32) -> usize {
    (SAMPLE_RATE / 1_000 * millis) as usize
}

// ---------------------------------------------------------------------------
// Pcm16Decoder
// ---------------------------------------------------------------------------

/// Stateful little-endian decoder for one stream.
///
/// A chunk boundary may split a sample; the dangling byte is kept and
/// prefixed to the next chunk.
#[derive(Debug, Default)]
pub struct Pcm16Decoder {
    pending: Option<u8>,
}

impl Pcm16Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> Vec<i16> {
        let mut out = Vec::with_capacity((bytes.len() + 1) / BYTES_PER_SAMPLE);
        let mut rest = bytes;

        if let Some(lo) = self.pending.take() {
            match rest.split_first() {
                Some((&hi, tail)) => {
                    out.push(i16::from_le_bytes([lo, hi]));
                    rest = tail;
                }
                None => {
                    self.pending = Some(lo);
                    return out;
                }
            }
        }

        let mut pairs = rest.chunks_exact(BYTES_PER_SAMPLE);
        out.extend(pairs.by_ref().map(|p| i16::from_le_bytes([p[0], p[1]])));
        self.pending = pairs.remainder().first().copied();
        out
    }

    /// `true` when half a sample is waiting for its second byte.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
