//! Audio asset metadata

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reference to a primary audio file and its metadata
///
/// `duration_seconds` is provisional until a decode completes; the envelope
/// builder reports the authoritative value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAsset {
    /// URL or path the audio bytes are fetched from
    pub source_location: String,
    #[serde(default)]
    pub duration_seconds: f64,
    pub sample_rate_hz: u32,
    #[serde(default = "default_channel_count")]
    pub channel_count: u16,
    pub original_file_name: String,
    /// Bit depth, when the uploader recorded one
    #[serde(default)]
    pub bits_per_sample: Option<u16>,
}

fn default_channel_count() -> u16 {
    2
}

/// Identity used to key in-flight envelope builds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey(String);

impl AssetKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AudioAsset {
    pub fn key(&self) -> AssetKey {
        AssetKey(self.source_location.clone())
    }

    /// Lower-case extension of the original file name, if any
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.original_file_name)
            .or_else(|| extension_of(&self.source_location))
    }

    /// File name used inside export bundles
    pub fn bundle_file_name(&self) -> String {
        let name = sanitize_file_name(&self.original_file_name);
        if name.is_empty() {
            format!("audio.{}", self.extension().unwrap_or_else(|| "wav".to_string()))
        } else {
            name
        }
    }
}

/// Extension of a path or URL, ignoring query strings and fragments
pub(crate) fn extension_of(location: &str) -> Option<String> {
    let trimmed = location.split(['?', '#']).next().unwrap_or(location);
    Path::new(trimmed)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
}

/// Strip directory components and characters that are unsafe in file names
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect::<String>()
        .trim()
        .trim_start_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, location: &str) -> AudioAsset {
        AudioAsset {
            source_location: location.to_string(),
            duration_seconds: 0.0,
            sample_rate_hz: 48_000,
            channel_count: 2,
            original_file_name: name.to_string(),
            bits_per_sample: None,
        }
    }

    #[test]
    fn test_extension_prefers_file_name() {
        assert_eq!(asset("Mix v2.WAV", "https://cdn/x.mp3").extension().as_deref(), Some("wav"));
        assert_eq!(asset("mix", "https://cdn/x.flac?sig=1").extension().as_deref(), Some("flac"));
        assert_eq!(asset("mix", "https://cdn/blob").extension(), None);
    }

    #[test]
    fn test_bundle_file_name_strips_paths() {
        assert_eq!(asset("../../etc/Mix: final?.wav", "x").bundle_file_name(), "Mix final.wav");
        assert_eq!(asset("", "https://cdn/a.mp3").bundle_file_name(), "audio.mp3");
        assert_eq!(asset("Démo é.wav", "x").bundle_file_name(), "Dmo .wav");
    }

    #[test]
    fn test_deserializes_camel_case() {
        let asset: AudioAsset = serde_json::from_str(
            r#"{"sourceLocation":"song.wav","sampleRateHz":44100,"originalFileName":"song.wav"}"#,
        )
        .unwrap();
        assert_eq!(asset.sample_rate_hz, 44_100);
        assert_eq!(asset.channel_count, 2);
        assert_eq!(asset.duration_seconds, 0.0);
        assert_eq!(asset.key().as_str(), "song.wav");
    }
}
