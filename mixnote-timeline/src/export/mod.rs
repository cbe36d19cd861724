//! DAW export: job model, format serializers and bundling
//!
//! Serializers are pure functions of an [`ExportJob`] and the primary
//! [`AudioAsset`]; the only non-determinism is the identifier generator,
//! which callers inject.

use mixnote_common::config::ExportConfig;
use mixnote_common::IdGenerator;
use serde::{Deserialize, Serialize};

use crate::asset::{extension_of, sanitize_file_name, AudioAsset};
use crate::markers::{translate, Annotation, Marker};

pub mod aaf;
pub mod bundle;
pub mod instructions;
pub mod reaper;

pub use bundle::{Bundle, BundleFile, Bundler, SkippedVoiceNote};

/// Silence appended after the last marker or track end
pub const PROJECT_TAIL_SECONDS: f64 = 30.0;

const UNTITLED: &str = "untitled";

/// Export permissions resolved by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityFlags {
    #[serde(default)]
    pub voice_notes_allowed: bool,
}

/// A voice note placed on its own track at the annotation's timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceTrack {
    pub annotation_id: String,
    pub timestamp_seconds: f64,
    pub author: String,
    /// Where the voice-note bytes are fetched from
    pub location: String,
    /// Name of the file inside the bundle
    pub file_name: String,
    /// Real duration when known, else the configured default
    pub duration_seconds: f64,
    pub duration_known: bool,
}

impl VoiceTrack {
    pub fn end_seconds(&self) -> f64 {
        self.timestamp_seconds + self.duration_seconds
    }
}

/// One export invocation; not persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub project_title: String,
    pub sanitized_title: String,
    pub sample_rate_hz: u32,
    pub markers: Vec<Marker>,
    pub voice_tracks: Vec<VoiceTrack>,
    pub capability_flags: CapabilityFlags,
    /// Bit depth for source descriptors when the asset does not state one
    pub default_bits_per_sample: u16,
}

impl ExportJob {
    /// Derive markers and voice tracks from the annotation list
    ///
    /// Replies never become markers or voice tracks. Voice tracks keep
    /// timestamp order (stable).
    pub fn from_annotations(
        title: &str,
        sample_rate_hz: u32,
        annotations: &[Annotation],
        capability_flags: CapabilityFlags,
        settings: &ExportConfig,
    ) -> Self {
        let markers = translate(annotations);

        let mut voiced: Vec<&Annotation> = annotations
            .iter()
            .filter(|a| a.is_root() && a.voice_note_location.is_some())
            .collect();
        voiced.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));

        let voice_tracks = voiced
            .into_iter()
            .enumerate()
            .filter_map(|(i, a)| {
                let location = a.voice_note_location.clone()?;
                let known = a
                    .voice_note_duration_seconds
                    .filter(|d| d.is_finite() && *d > 0.0);
                Some(VoiceTrack {
                    annotation_id: a.id.clone(),
                    timestamp_seconds: a.timestamp_seconds,
                    author: a.author_username.clone(),
                    file_name: voice_file_name(i + 1, &a.author_username, &location),
                    location,
                    duration_seconds: known.unwrap_or(settings.default_voice_duration_seconds),
                    duration_known: known.is_some(),
                })
            })
            .collect();

        Self {
            project_title: title.to_string(),
            sanitized_title: sanitize_title(title),
            sample_rate_hz,
            markers,
            voice_tracks,
            capability_flags,
            default_bits_per_sample: settings.bits_per_sample,
        }
    }

    /// Voice tracks that go into the project (none unless allowed)
    pub fn included_voice_tracks(&self) -> &[VoiceTrack] {
        if self.capability_flags.voice_notes_allowed {
            &self.voice_tracks
        } else {
            &[]
        }
    }

    /// `ceil(max(end times) + 30)` seconds
    ///
    /// End times cover the primary asset, every marker and every included
    /// voice track.
    pub fn project_length_seconds(&self, asset: &AudioAsset) -> u64 {
        let last_end = self
            .markers
            .iter()
            .map(|m| m.timestamp_seconds)
            .chain(self.included_voice_tracks().iter().map(VoiceTrack::end_seconds))
            .chain(std::iter::once(asset.duration_seconds))
            .filter(|t| t.is_finite())
            .fold(0.0f64, f64::max);
        (last_end + PROJECT_TAIL_SECONDS).ceil() as u64
    }

    pub fn bits_per_sample(&self, asset: &AudioAsset) -> u16 {
        asset.bits_per_sample.unwrap_or(self.default_bits_per_sample)
    }
}

/// Keep ASCII alphanumerics, space, dash and underscore
///
/// Non-ASCII letters are dropped so the name is portable across DAW hosts
/// and archive tools.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned.to_string()
    }
}

fn voice_file_name(index: usize, author: &str, location: &str) -> String {
    let author = sanitize_file_name(author).replace([' ', '.'], "_");
    let author = if author.is_empty() { "unknown".to_string() } else { author };
    let ext = extension_of(location).unwrap_or_else(|| "webm".to_string());
    format!("voice_{:02}_{}.{}", index, author, ext)
}

/// Supported project formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Line-oriented REAPER project (`.rpp`)
    Reaper,
    /// AAF-style XML interchange (`.xml`)
    AafXml,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Reaper, ExportFormat::AafXml];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Reaper => "rpp",
            ExportFormat::AafXml => "xml",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExportFormat::Reaper => "REAPER project",
            ExportFormat::AafXml => "AAF-style XML interchange (Pro Tools, Logic, Nuendo)",
        }
    }

    pub fn file_name(self, job: &ExportJob) -> String {
        format!("{}.{}", job.sanitized_title, self.extension())
    }

    /// Render the project text for this format
    pub fn serialize(self, job: &ExportJob, asset: &AudioAsset, ids: &mut dyn IdGenerator) -> String {
        match self {
            ExportFormat::Reaper => reaper::serialize(job, asset, ids),
            ExportFormat::AafXml => aaf::serialize(job, asset, ids),
        }
    }
}
