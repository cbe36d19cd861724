//! Human-readable import instructions shipped with every bundle

use chrono::{DateTime, Utc};
use mixnote_common::time::format_timecode;

use super::bundle::SkippedVoiceNote;
use super::ExportJob;
use crate::markers::glyph_legend;

/// What a bundled file is, for the instructions listing
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub description: String,
}

/// Render the instructions document
pub fn render(
    job: &ExportJob,
    files: &[FileEntry],
    skipped: &[SkippedVoiceNote],
    exported_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("{} - DAW import instructions\n", job.project_title));
    out.push_str(&format!(
        "Exported {}\n",
        exported_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(&format!("Sample rate: {} Hz\n\n", job.sample_rate_hz));

    out.push_str("FILES\n");
    for file in files {
        out.push_str(&format!("  {}  ({})\n", file.name, file.description));
    }
    out.push('\n');

    if !skipped.is_empty() {
        out.push_str(&format!("MISSING VOICE NOTES ({})\n", skipped.len()));
        out.push_str("  These voice notes could not be downloaded and are not in this bundle.\n");
        out.push_str("  The project files still reference them by file name:\n");
        for note in skipped {
            out.push_str(&format!(
                "  {}  {}  {} ({})\n",
                note.file_name,
                format_timecode(note.timestamp_seconds),
                note.author,
                note.reason
            ));
        }
        out.push('\n');
    } else if !job.voice_tracks.is_empty() && !job.capability_flags.voice_notes_allowed {
        out.push_str(&format!(
            "Voice notes ({}) are not included with this export.\n\n",
            job.voice_tracks.len()
        ));
    }

    out.push_str("MARKER LEGEND\n");
    for (glyph, meaning) in glyph_legend() {
        out.push_str(&format!("  {}  {}\n", glyph, meaning));
    }
    out.push('\n');

    out.push_str(&format!("MARKERS ({})\n", job.markers.len()));
    if job.markers.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, marker) in job.markers.iter().enumerate() {
        out.push_str(&format!(
            "  {:>3}. {}  {}\n",
            i + 1,
            format_timecode(marker.timestamp_seconds),
            marker.label
        ));
    }
    out.push('\n');

    out.push_str("IMPORTING\n");
    out.push_str(&format!(
        "  REAPER: open {}.rpp directly. Keep the audio files in the same folder.\n",
        job.sanitized_title
    ));
    out.push_str(&format!(
        "  Pro Tools / Logic / Nuendo: import {}.xml as an AAF/XML session and relink\n",
        job.sanitized_title
    ));
    out.push_str("  media to this folder if prompted.\n");
    out.push_str("  Any DAW: drag the audio files in at 0:00 (voice notes at their marker time) and\n");
    out.push_str("  use the marker list above.\n");

    out
}
