//! Annotation and asset builders

use mixnote_timeline::markers::{Annotation, AnnotationType, Priority};
use mixnote_timeline::AudioAsset;

pub fn annotation(id: &str, ts: f64, kind: AnnotationType, priority: Priority, text: &str) -> Annotation {
    Annotation {
        id: id.to_string(),
        timestamp_seconds: ts,
        text: text.to_string(),
        annotation_type: kind,
        priority,
        author_username: "alex".to_string(),
        voice_note_location: None,
        voice_note_duration_seconds: None,
        parent_id: None,
    }
}

pub fn voice_annotation(id: &str, ts: f64, location: &str) -> Annotation {
    Annotation {
        voice_note_location: Some(location.to_string()),
        ..annotation(id, ts, AnnotationType::Voice, Priority::Medium, "voice note")
    }
}

pub fn asset(location: &str, file_name: &str, duration: f64) -> AudioAsset {
    AudioAsset {
        source_location: location.to_string(),
        duration_seconds: duration,
        sample_rate_hz: 8_000,
        channel_count: 2,
        original_file_name: file_name.to_string(),
        bits_per_sample: Some(16),
    }
}
