//! Viewport controller: time ↔ screen-fraction mapping under zoom/scroll
//!
//! The controller is the single writer of [`Viewport`] state. Every input
//! is clamped, never rejected:
//! - `zoom_level ∈ [MIN_ZOOM, MAX_ZOOM]`
//! - `scroll_offset_seconds ∈ [0, duration - visible_duration]`
//!
//! so `scroll_offset_seconds + visible_duration ≤ duration` holds after
//! any sequence of operations.

use std::ops::Range;

use crate::envelope::WaveformEnvelope;
use crate::markers::Marker;

/// Fully zoomed out: the whole asset is visible
pub const MIN_ZOOM: f64 = 1.0;
/// Deepest zoom
pub const MAX_ZOOM: f64 = 64.0;
/// Multiplier applied by the zoom step operations
pub const ZOOM_STEP: f64 = 1.5;
/// Playhead position (fraction of the window) that triggers and receives auto-follow
pub const FOLLOW_THRESHOLD: f64 = 0.9;

/// Visible time window over an asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom_level: f64,
    pub scroll_offset_seconds: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom_level: MIN_ZOOM,
            scroll_offset_seconds: 0.0,
        }
    }
}

/// Marker placed in the visible window
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPosition {
    pub fraction: f64,
    pub timestamp_seconds: f64,
    pub label: String,
    pub color: String,
}

/// Owns viewport state for one asset duration
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    viewport: Viewport,
    duration_seconds: f64,
}

impl ViewportController {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            viewport: Viewport::default(),
            duration_seconds: sanitize_duration(duration_seconds),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Replace the duration (e.g. once decoding reports the authoritative value)
    ///
    /// Zoom is kept; the offset is re-clamped into the new range.
    pub fn set_duration(&mut self, duration_seconds: f64) {
        self.duration_seconds = sanitize_duration(duration_seconds);
        self.clamp_offset();
    }

    /// `duration / zoom_level`
    pub fn visible_duration(&self) -> f64 {
        self.duration_seconds / self.viewport.zoom_level
    }

    /// Zoom by `factor`, keeping `focal_time_seconds` at the same screen position
    pub fn zoom_at(&mut self, focal_time_seconds: f64, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let old_visible = self.visible_duration();
        let focal_fraction = if old_visible > 0.0 && focal_time_seconds.is_finite() {
            ((focal_time_seconds - self.viewport.scroll_offset_seconds) / old_visible).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let focal_time = self.fraction_to_time(focal_fraction);

        self.viewport.zoom_level = (self.viewport.zoom_level * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.viewport.scroll_offset_seconds = focal_time - focal_fraction * self.visible_duration();
        self.clamp_offset();
    }

    /// Zoom in one step, anchored at the left edge of the window
    pub fn zoom_in_step(&mut self) {
        let anchor = self.viewport.scroll_offset_seconds;
        self.zoom_at(anchor, ZOOM_STEP);
    }

    /// Zoom out one step, centered on the current window midpoint
    pub fn zoom_out_step(&mut self) {
        let midpoint = self.viewport.scroll_offset_seconds + self.visible_duration() / 2.0;
        self.viewport.zoom_level = (self.viewport.zoom_level / ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.viewport.scroll_offset_seconds = midpoint - self.visible_duration() / 2.0;
        self.clamp_offset();
    }

    /// Back to the full view
    pub fn reset(&mut self) {
        self.viewport = Viewport::default();
    }

    /// Scroll so the window starts at `offset_seconds` (clamped)
    pub fn scroll_to(&mut self, offset_seconds: f64) {
        if offset_seconds.is_finite() {
            self.viewport.scroll_offset_seconds = offset_seconds;
        }
        self.clamp_offset();
    }

    /// Keep the playhead in view during playback
    ///
    /// Once the playhead reaches the last 10% of the window, the window moves
    /// so the playhead sits at the 90% mark. A playhead that jumped before
    /// the window (backward seek) moves the window to start at the playhead.
    /// Idempotent for a repeated time.
    pub fn follow_playhead(&mut self, current_time_seconds: f64) {
        if !current_time_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return;
        }
        let visible = self.visible_duration();
        let offset = self.viewport.scroll_offset_seconds;

        if current_time_seconds >= offset + FOLLOW_THRESHOLD * visible {
            self.viewport.scroll_offset_seconds = current_time_seconds - FOLLOW_THRESHOLD * visible;
            self.clamp_offset();
        } else if current_time_seconds < offset {
            self.viewport.scroll_offset_seconds = current_time_seconds;
            self.clamp_offset();
        }
    }

    /// Position of `time_seconds` in the window, clamped to `[0, 1]`
    pub fn time_to_fraction(&self, time_seconds: f64) -> f64 {
        let visible = self.visible_duration();
        if visible <= 0.0 || !time_seconds.is_finite() {
            return 0.0;
        }
        ((time_seconds - self.viewport.scroll_offset_seconds) / visible).clamp(0.0, 1.0)
    }

    /// Inverse of [`Self::time_to_fraction`] for `fraction ∈ [0, 1]`
    pub fn fraction_to_time(&self, fraction: f64) -> f64 {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        self.viewport.scroll_offset_seconds + fraction * self.visible_duration()
    }

    /// Whether `time_seconds` lies inside the visible window
    pub fn contains(&self, time_seconds: f64) -> bool {
        let start = self.viewport.scroll_offset_seconds;
        self.duration_seconds > 0.0
            && time_seconds >= start
            && time_seconds <= start + self.visible_duration()
    }

    /// Index range of `envelope` covered by the window
    ///
    /// Uses `samples_per_second = envelope.len() / duration`; empty when the
    /// duration or the envelope is empty.
    pub fn visible_slice(&self, envelope: &WaveformEnvelope) -> Range<usize> {
        let len = envelope.len();
        if self.duration_seconds <= 0.0 || len == 0 {
            return 0..0;
        }
        let samples_per_second = len as f64 / self.duration_seconds;
        let start_seconds = self.viewport.scroll_offset_seconds;
        let end_seconds = start_seconds + self.visible_duration();

        let start = ((start_seconds * samples_per_second).floor() as usize).min(len);
        let end = ((end_seconds * samples_per_second).ceil() as usize).clamp(start, len);
        start..end
    }

    /// Markers inside the window with their screen fractions, in marker order
    pub fn marker_positions(&self, markers: &[Marker]) -> Vec<MarkerPosition> {
        markers
            .iter()
            .filter(|m| self.contains(m.timestamp_seconds))
            .map(|m| MarkerPosition {
                fraction: self.time_to_fraction(m.timestamp_seconds),
                timestamp_seconds: m.timestamp_seconds,
                label: m.label.clone(),
                color: m.color.hex(),
            })
            .collect()
    }

    fn clamp_offset(&mut self) {
        let max_offset = (self.duration_seconds - self.visible_duration()).max(0.0);
        let offset = self.viewport.scroll_offset_seconds;
        self.viewport.scroll_offset_seconds = if offset.is_finite() {
            offset.clamp(0.0, max_offset)
        } else {
            0.0
        };
    }
}

fn sanitize_duration(duration_seconds: f64) -> f64 {
    if duration_seconds.is_finite() && duration_seconds > 0.0 {
        duration_seconds
    } else {
        0.0
    }
}
