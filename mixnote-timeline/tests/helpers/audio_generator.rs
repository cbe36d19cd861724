//! Audio test data generation
//!
//! WAV data with known characteristics, written to memory so tests do not
//! depend on fixture files:
//! - Silent audio (all zeros)
//! - Sine waves with a linear fade-in (amplitude grows over the file)

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::io::Cursor;
use std::path::Path;

/// Standard test sample rate (8 kHz keeps fixtures small)
pub const TEST_SAMPLE_RATE: u32 = 8_000;

fn encode(channels: u16, frames: usize, mut sample: impl FnMut(usize) -> f32) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("wav writer");
        for frame in 0..frames {
            let value = (sample(frame).clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(value).expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// Silent WAV of `seconds` duration
pub fn silent_wav_bytes(seconds: f64, channels: u16) -> Vec<u8> {
    let frames = (seconds * TEST_SAMPLE_RATE as f64) as usize;
    encode(channels, frames, |_| 0.0)
}

/// 440 Hz sine whose amplitude ramps linearly from 0 to 1
pub fn sine_wav_bytes(seconds: f64, channels: u16) -> Vec<u8> {
    let frames = (seconds * TEST_SAMPLE_RATE as f64) as usize;
    encode(channels, frames, |frame| {
        let t = frame as f32 / TEST_SAMPLE_RATE as f32;
        let gain = frame as f32 / frames.max(1) as f32;
        gain * (2.0 * PI * 440.0 * t).sin()
    })
}

/// Write WAV bytes to `path`
pub fn write_wav(path: &Path, bytes: &[u8]) {
    std::fs::write(path, bytes).expect("write wav file");
}
