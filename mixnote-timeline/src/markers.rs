//! Annotation-to-marker translation
//!
//! Annotations come from an external persistence collaborator and are
//! read-only here. Only root annotations (no `parent_id`) become markers;
//! replies are dropped.
//!
//! Output order is a stable sort by timestamp. That order determines the
//! 1-based marker numbering in every serializer, so ties must keep their
//! input order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Maximum characters of annotation text kept in a marker label
pub const LABEL_TEXT_LIMIT: usize = 50;
const ELLIPSIS: &str = "...";

/// Annotation category as stored by the collaboration backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Comment,
    Issue,
    Approval,
    Voice,
    Section,
    Marker,
    #[serde(other)]
    Other,
}

/// Annotation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Timestamp-anchored comment on an audio asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub timestamp_seconds: f64,
    #[serde(default)]
    pub text: String,
    pub annotation_type: AnnotationType,
    #[serde(default)]
    pub priority: Priority,
    pub author_username: String,
    #[serde(default)]
    pub voice_note_location: Option<String>,
    /// Length of the voice note, when the uploader measured it
    #[serde(default)]
    pub voice_note_duration_seconds: Option<f64>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Annotation {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Marker colors, each with a fixed RGB value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    /// Critical priority
    Red,
    /// High priority
    Orange,
    /// Issue annotations
    Coral,
    /// Approvals
    Green,
    /// Voice notes
    Purple,
    /// Sections
    Blue,
    /// Everything else
    Sky,
}

impl ColorToken {
    /// `0xRRGGBB` value; serializers that want an integer color use this
    pub fn rgb(self) -> u32 {
        match self {
            ColorToken::Red => 0xEF4444,
            ColorToken::Orange => 0xF97316,
            ColorToken::Coral => 0xF87171,
            ColorToken::Green => 0x22C55E,
            ColorToken::Purple => 0xA855F7,
            ColorToken::Blue => 0x2563EB,
            ColorToken::Sky => 0x3B82F6,
        }
    }

    /// `#RRGGBB`
    pub fn hex(self) -> String {
        format!("#{:06X}", self.rgb())
    }
}

/// How a target tool should present the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Cue,
    Marker,
    Region,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::Cue => "cue",
            MarkerKind::Marker => "marker",
            MarkerKind::Region => "region",
        }
    }
}

/// Export-ready marker derived from a root annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub annotation_id: String,
    pub timestamp_seconds: f64,
    pub label: String,
    pub color: ColorToken,
    pub kind: MarkerKind,
    /// Full, untruncated annotation text
    pub comment: String,
    pub author: String,
}

/// Glyph prepended for urgent priorities
pub fn priority_glyph(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "🔴",
        Priority::High => "🟠",
        Priority::Medium | Priority::Low => "",
    }
}

pub fn type_glyph(annotation_type: AnnotationType) -> &'static str {
    match annotation_type {
        AnnotationType::Issue => "⚠️",
        AnnotationType::Approval => "✅",
        AnnotationType::Voice => "🎤",
        AnnotationType::Section => "📍",
        AnnotationType::Marker => "🔖",
        AnnotationType::Comment | AnnotationType::Other => "💬",
    }
}

/// Every glyph that can appear in a label, with its meaning
pub fn glyph_legend() -> Vec<(&'static str, &'static str)> {
    vec![
        (priority_glyph(Priority::Critical), "Critical priority"),
        (priority_glyph(Priority::High), "High priority"),
        (type_glyph(AnnotationType::Issue), "Issue to fix"),
        (type_glyph(AnnotationType::Approval), "Approved"),
        (type_glyph(AnnotationType::Voice), "Voice note"),
        (type_glyph(AnnotationType::Section), "Section start"),
        (type_glyph(AnnotationType::Marker), "Marker / cue point"),
        (type_glyph(AnnotationType::Comment), "Comment"),
    ]
}

pub fn color_for(annotation: &Annotation) -> ColorToken {
    match annotation.priority {
        Priority::Critical => return ColorToken::Red,
        Priority::High => return ColorToken::Orange,
        Priority::Medium | Priority::Low => {}
    }
    match annotation.annotation_type {
        AnnotationType::Issue => ColorToken::Coral,
        AnnotationType::Approval => ColorToken::Green,
        AnnotationType::Voice => ColorToken::Purple,
        AnnotationType::Section => ColorToken::Blue,
        _ => ColorToken::Sky,
    }
}

pub fn kind_for(annotation_type: AnnotationType) -> MarkerKind {
    match annotation_type {
        AnnotationType::Section => MarkerKind::Region,
        AnnotationType::Marker => MarkerKind::Cue,
        _ => MarkerKind::Marker,
    }
}

/// Cut text to [`LABEL_TEXT_LIMIT`] characters, ending in `...` when cut
pub fn truncate_text(text: &str) -> String {
    if text.chars().count() <= LABEL_TEXT_LIMIT {
        return text.to_string();
    }
    let keep = LABEL_TEXT_LIMIT - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// `<priority glyph><type glyph> <author>: <truncated text>`
pub fn compose_label(annotation: &Annotation) -> String {
    format!(
        "{}{} {}: {}",
        priority_glyph(annotation.priority),
        type_glyph(annotation.annotation_type),
        annotation.author_username,
        truncate_text(&annotation.text)
    )
}

fn by_timestamp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Translate annotations into markers ordered by timestamp (stable)
pub fn translate(annotations: &[Annotation]) -> Vec<Marker> {
    let mut roots: Vec<&Annotation> = annotations.iter().filter(|a| a.is_root()).collect();
    roots.sort_by(|a, b| by_timestamp(a.timestamp_seconds, b.timestamp_seconds));

    roots
        .into_iter()
        .map(|a| Marker {
            annotation_id: a.id.clone(),
            timestamp_seconds: a.timestamp_seconds,
            label: compose_label(a),
            color: color_for(a),
            kind: kind_for(a.annotation_type),
            comment: a.text.clone(),
            author: a.author_username.clone(),
        })
        .collect()
}
