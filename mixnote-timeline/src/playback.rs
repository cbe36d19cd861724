//! Playback clock adapter
//!
//! Bridges an external playback position source (an audio element, a
//! transport) into viewport auto-follow and progress coloring. One call per
//! time-update event; callers serialize events. No blocking I/O.
//!
//! Auto-follow only runs while playing and while the user is not dragging
//! the viewport. Calling [`PlaybackClock::on_time_update`] twice with the
//! same time leaves the viewport unchanged the second time.

use std::ops::Range;
use tracing::trace;

use crate::envelope::WaveformEnvelope;
use crate::viewport::ViewportController;

/// Transport state reported by the playback source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Highlight/progress state for the visible envelope slice
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    /// Playhead time, clamped to `[0, duration]`
    pub playhead_seconds: f64,
    /// Playhead position in the window; `None` when outside it
    pub playhead_fraction: Option<f64>,
    /// Envelope indices currently visible
    pub visible: Range<usize>,
    /// Visible indices already played (drawn in the progress color)
    pub played: Range<usize>,
    /// Overall progress through the asset, `[0, 1]`
    pub progress_ratio: f64,
}

/// Adapter state: transport state plus drag suppression
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    state: PlaybackState,
    user_dragging: bool,
    last_time: Option<f64>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    /// User started/stopped dragging the viewport; follow is suspended meanwhile
    pub fn set_user_dragging(&mut self, dragging: bool) {
        self.user_dragging = dragging;
    }

    pub fn is_following(&self) -> bool {
        self.state == PlaybackState::Playing && !self.user_dragging
    }

    /// Last playhead time seen, if any
    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// Handle one time-update event
    pub fn on_time_update(
        &mut self,
        time_seconds: f64,
        viewport: &mut ViewportController,
        envelope: &WaveformEnvelope,
    ) -> ProgressState {
        let duration = viewport.duration_seconds();
        let playhead = if time_seconds.is_finite() {
            time_seconds.clamp(0.0, duration)
        } else {
            0.0
        };

        if let Some(previous) = self.last_time {
            if playhead < previous {
                trace!(from = previous, to = playhead, "Playhead moved backward (seek)");
            }
        }
        self.last_time = Some(playhead);

        if self.is_following() {
            viewport.follow_playhead(playhead);
        }

        progress(playhead, viewport, envelope)
    }

    /// Progress for the current playhead without advancing anything
    pub fn snapshot(&self, viewport: &ViewportController, envelope: &WaveformEnvelope) -> ProgressState {
        progress(self.last_time.unwrap_or(0.0), viewport, envelope)
    }
}

fn progress(playhead: f64, viewport: &ViewportController, envelope: &WaveformEnvelope) -> ProgressState {
    let duration = viewport.duration_seconds();
    let visible = viewport.visible_slice(envelope);

    let played_end = if duration > 0.0 && !envelope.is_empty() {
        let per_second = envelope.len() as f64 / duration;
        ((playhead * per_second).floor() as usize).clamp(visible.start, visible.end)
    } else {
        visible.start
    };

    ProgressState {
        playhead_seconds: playhead,
        playhead_fraction: viewport
            .contains(playhead)
            .then(|| viewport.time_to_fraction(playhead)),
        visible: visible.clone(),
        played: visible.start..played_end,
        progress_ratio: if duration > 0.0 { playhead / duration } else { 0.0 },
    }
}
