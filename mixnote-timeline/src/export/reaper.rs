//! REAPER project (`.rpp`) serializer
//!
//! Nested `<BLOCK ... >` structure, two-space indentation. Header carries
//! the project length as `MAXPROJLEN 0 <seconds>`; markers are numbered
//! from 1 in timestamp order with positions at 6 decimal places and the
//! marker color as a plain integer (`0xRRGGBB`).

use mixnote_common::IdGenerator;

use super::{ExportJob, VoiceTrack};
use crate::asset::{extension_of, AudioAsset};

const PROJECT_VERSION: &str = "0.1 \"6.0/mixnote\" 0";

/// Render `job` as REAPER project text
pub fn serialize(job: &ExportJob, asset: &AudioAsset, ids: &mut dyn IdGenerator) -> String {
    let project_length = job.project_length_seconds(asset);
    let mut out = String::new();

    line(&mut out, 0, &format!("<REAPER_PROJECT {}", PROJECT_VERSION));
    line(&mut out, 1, &format!("TITLE \"{}\"", escape(&job.project_title)));
    line(&mut out, 1, &format!("SAMPLERATE {} 0 0", job.sample_rate_hz));
    line(&mut out, 1, &format!("MAXPROJLEN 0 {}", project_length));
    line(&mut out, 1, "TEMPO 120 4 4");

    for (i, marker) in job.markers.iter().enumerate() {
        line(
            &mut out,
            1,
            &format!(
                "MARKER {} {:.6} \"{}\" 0 {} 1",
                i + 1,
                marker.timestamp_seconds,
                escape(&marker.label),
                marker.color.rgb()
            ),
        );
    }

    let primary = asset.bundle_file_name();
    track(
        &mut out,
        ids,
        &job.project_title,
        0.0,
        project_length as f64,
        &primary,
        source_type(extension_of(&primary).as_deref()),
    );

    for voice in job.included_voice_tracks() {
        track(
            &mut out,
            ids,
            &voice_track_name(voice),
            voice.timestamp_seconds,
            voice.duration_seconds,
            &voice.file_name,
            source_type(extension_of(&voice.file_name).as_deref()),
        );
    }

    line(&mut out, 0, ">");
    out
}

fn track(
    out: &mut String,
    ids: &mut dyn IdGenerator,
    name: &str,
    position: f64,
    length: f64,
    file: &str,
    source: &str,
) {
    line(out, 1, &format!("<TRACK {}", ids.next()));
    line(out, 2, &format!("NAME \"{}\"", escape(name)));
    line(out, 2, "<ITEM");
    line(out, 3, &format!("POSITION {:.6}", position));
    line(out, 3, &format!("LENGTH {:.6}", length));
    line(out, 3, &format!("IGUID {}", ids.next()));
    line(out, 3, &format!("NAME \"{}\"", escape(file)));
    line(out, 3, &format!("<SOURCE {}", source));
    line(out, 4, &format!("FILE \"{}\"", escape(file)));
    line(out, 3, ">");
    line(out, 2, ">");
    line(out, 1, ">");
}

fn voice_track_name(voice: &VoiceTrack) -> String {
    format!("Voice: {}", voice.author)
}

fn line(out: &mut String, depth: usize, text: &str) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(text);
    out.push('\n');
}

/// REAPER source block type for a file extension
fn source_type(extension: Option<&str>) -> &'static str {
    match extension {
        Some("mp3") => "MP3",
        Some("flac") => "FLAC",
        Some("ogg") | Some("oga") => "VORBIS",
        Some("opus") | Some("webm") => "OPUS",
        Some("m4a") | Some("mp4") | Some("aac") => "VIDEO",
        _ => "WAVE",
    }
}

/// Escape a string for a double-quoted RPP field
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
