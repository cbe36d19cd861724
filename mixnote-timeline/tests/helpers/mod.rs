//! Test helpers for mixnote-timeline integration tests
//!
//! - `audio_generator`: deterministic WAV bytes/files with known amplitude
//! - `fixtures`: annotation and asset builders

#![allow(dead_code)]

pub mod audio_generator;
pub mod fixtures;

pub use audio_generator::{sine_wav_bytes, silent_wav_bytes, write_wav};
pub use fixtures::{annotation, asset, voice_annotation};
