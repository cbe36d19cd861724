//! Audio decoding
//!
//! **Purpose:** Decode an in-memory audio byte stream to per-channel f32 PCM
//!
//! Uses symphonia for format-agnostic decoding (WAV, MP3, FLAC, AAC, OGG, ...).
//! The envelope only consumes channel 0, but all channels are kept so the
//! channel count can be reported.

use async_trait::async_trait;
use std::io::Cursor;
use symphonia::core::audio::Signal;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Decoded audio result
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// One sample vector per channel (f32, range [-1.0, 1.0])
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Samples of the first channel (empty if there are none)
    pub fn first_channel(&self) -> &[f32] {
        self.channels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Duration derived from the first channel's frame count
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.first_channel().len() as f64 / self.sample_rate as f64
    }
}

/// Capability to decode an audio byte stream
///
/// Decoding may take unbounded time; the envelope builder wraps every call
/// in a timeout.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Decode `bytes`; `extension` is a format hint (e.g. `"mp3"`)
    async fn decode(&self, bytes: Vec<u8>, extension: Option<String>) -> Result<DecodedAudio>;
}

/// Symphonia-backed decoder
///
/// The CPU-bound decode runs on the blocking pool so the caller's event
/// loop stays responsive.
#[derive(Debug, Default, Clone)]
pub struct SymphoniaDecoder;

#[async_trait]
impl AudioDecoder for SymphoniaDecoder {
    async fn decode(&self, bytes: Vec<u8>, extension: Option<String>) -> Result<DecodedAudio> {
        tokio::task::spawn_blocking(move || decode_bytes(bytes, extension.as_deref()))
            .await
            .map_err(|e| Error::Decode(format!("Decode task failed: {}", e)))?
    }
}

/// Decode audio bytes to per-channel f32 PCM samples
///
/// **Algorithm:**
/// 1. Probe format using symphonia (extension used as hint)
/// 2. Find default audio track
/// 3. Decode all packets, converting each buffer to f32
/// 4. Append each channel's samples to its own vector
///
/// Packets that fail with a recoverable decode error are skipped.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    debug!(bytes = bytes.len(), extension = ?extension, "Decoding audio");

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe audio: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate unknown".to_string()))?;
    let channel_count = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    debug!(sample_rate, channels = channel_count, "Audio stream info");

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count.max(1)];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(Error::Decode(format!("Failed to decode packet: {}", e))),
        };

        let mut buffer = decoded.make_equivalent::<f32>();
        decoded.convert(&mut buffer);

        let buffer_channels = buffer.spec().channels.count();
        if buffer_channels > channels.len() {
            channels.resize(buffer_channels, Vec::new());
        }
        for (ch, out) in channels.iter_mut().enumerate().take(buffer_channels) {
            out.extend_from_slice(buffer.chan(ch));
        }
    }

    let audio = DecodedAudio {
        channels,
        sample_rate,
    };

    debug!(
        frames = audio.first_channel().len(),
        duration_seconds = format!("{:.2}", audio.duration_seconds()),
        "Audio decoding complete"
    );

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                // Left: full-scale square wave, right: silence
                let left = if (i / 10) % 2 == 0 { i16::MAX } else { i16::MIN + 1 };
                writer.write_sample(left).unwrap();
                for _ in 1..channels {
                    writer.write_sample(0i16).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav_keeps_channels_separate() {
        let audio = decode_bytes(wav_bytes(8_000, 2, 8_000), Some("wav")).unwrap();
        assert_eq!(audio.sample_rate, 8_000);
        assert_eq!(audio.channels.len(), 2);
        assert_eq!(audio.first_channel().len(), 8_000);
        assert!((audio.duration_seconds() - 1.0).abs() < 1e-9);
        assert!(audio.first_channel().iter().all(|s| s.abs() > 0.99));
        assert!(audio.channels[1].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_decode_without_hint() {
        let audio = decode_bytes(wav_bytes(16_000, 1, 1_600), None).unwrap();
        assert_eq!(audio.channels.len(), 1);
        assert!((audio.duration_seconds() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = decode_bytes(b"definitely not audio".to_vec(), Some("mp3")).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_symphonia_decoder_runs_async() {
        let audio = SymphoniaDecoder
            .decode(wav_bytes(8_000, 1, 4_000), Some("wav".to_string()))
            .await
            .unwrap();
        assert!((audio.duration_seconds() - 0.5).abs() < 1e-9);
    }
}
