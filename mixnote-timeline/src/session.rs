//! Timeline session: one asset, its envelope, viewport and playback clock
//!
//! The session is an explicit state machine (`Open → Ready → Closed`) fed by
//! [`TimelineEvent`]s from a single dispatch loop. Envelope builds are keyed
//! by a [`BuildTicket`] (asset identity + generation); a result whose ticket
//! has been superseded by a later `begin_load` is dropped without touching
//! session state.
//!
//! The rendering surface pulls state through the accessors on its own
//! schedule; the session schedules nothing itself.

use std::ops::Range;
use tracing::{debug, info, warn};

use crate::asset::{AssetKey, AudioAsset};
use crate::envelope::{builder::describe_failure, BuildStatus, EnvelopeBuild, EnvelopeBuilder, WaveformEnvelope};
use crate::markers::Marker;
use crate::playback::{PlaybackClock, PlaybackState, ProgressState};
use crate::viewport::{MarkerPosition, Viewport, ViewportController};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created or reloading; no envelope accepted for the current asset yet
    Open,
    /// Envelope and authoritative duration available
    Ready,
    /// Torn down; all events are ignored
    Closed,
}

/// Identity of one envelope build request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTicket {
    pub asset: AssetKey,
    pub generation: u64,
}

/// Results and inputs consumed by [`TimelineSession::dispatch`]
#[derive(Debug)]
pub enum TimelineEvent {
    /// Envelope build finished (decoded or degraded)
    EnvelopeBuilt { ticket: BuildTicket, build: EnvelopeBuild },
    /// Envelope build failed fatally (primary audio unavailable)
    EnvelopeFailed { ticket: BuildTicket, message: String },
    /// Playback position moved
    PlaybackPositionChanged { time_seconds: f64 },
    /// Transport started/paused/stopped
    PlaybackStateChanged(PlaybackState),
    /// User began or ended dragging the viewport
    ViewportDrag { active: bool },
}

/// What a dispatched event changed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// A build was accepted; reported once per accepted build
    DurationReported { duration_seconds: f64, status: BuildStatus },
    /// A build for the current asset failed; single human-readable summary
    LoadFailed { message: String },
    /// Result for a superseded build was discarded
    StaleResultIgnored,
    /// Playback progress after a time update
    Progress(ProgressState),
    /// Input accepted with no further output
    Unchanged,
    /// Session is closed
    Closed,
}

/// Per-asset timeline state owned by exactly one logical session
#[derive(Debug)]
pub struct TimelineSession {
    state: SessionState,
    asset: Option<AudioAsset>,
    generation: u64,
    envelope: WaveformEnvelope,
    build_status: Option<BuildStatus>,
    viewport: ViewportController,
    clock: PlaybackClock,
}

impl Default for TimelineSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Open,
            asset: None,
            generation: 0,
            envelope: WaveformEnvelope::default(),
            build_status: None,
            viewport: ViewportController::new(0.0),
            clock: PlaybackClock::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Switch to `asset`; any in-flight build for an earlier asset becomes stale
    ///
    /// Returns `None` once the session is closed.
    pub fn begin_load(&mut self, asset: AudioAsset) -> Option<BuildTicket> {
        if self.state == SessionState::Closed {
            return None;
        }
        self.generation += 1;
        let ticket = BuildTicket {
            asset: asset.key(),
            generation: self.generation,
        };

        debug!(asset = %ticket.asset.as_str(), generation = ticket.generation, "Loading asset");

        self.viewport = ViewportController::new(asset.duration_seconds);
        self.envelope = WaveformEnvelope::default();
        self.build_status = None;
        self.clock = PlaybackClock::new();
        self.asset = Some(asset);
        self.state = SessionState::Open;
        Some(ticket)
    }

    /// Run a build for `ticket` and wrap the outcome as an event
    ///
    /// Hosts may run this on their own task and feed the event back through
    /// their dispatch loop.
    pub async fn run_build(builder: &EnvelopeBuilder, ticket: BuildTicket, asset: &AudioAsset) -> TimelineEvent {
        match builder.build(asset).await {
            Ok(build) => TimelineEvent::EnvelopeBuilt { ticket, build },
            Err(e) => TimelineEvent::EnvelopeFailed {
                ticket,
                message: describe_failure(&e),
            },
        }
    }

    /// Convenience: `begin_load`, build, dispatch
    pub async fn load(&mut self, asset: AudioAsset, builder: &EnvelopeBuilder) -> SessionUpdate {
        let Some(ticket) = self.begin_load(asset.clone()) else {
            return SessionUpdate::Closed;
        };
        let event = Self::run_build(builder, ticket, &asset).await;
        self.dispatch(event)
    }

    /// Apply one event; events are applied strictly in call order
    pub fn dispatch(&mut self, event: TimelineEvent) -> SessionUpdate {
        if self.state == SessionState::Closed {
            return SessionUpdate::Closed;
        }

        match event {
            TimelineEvent::EnvelopeBuilt { ticket, build } => {
                if !self.is_current(&ticket) || build.asset != ticket.asset {
                    debug!(asset = %ticket.asset.as_str(), generation = ticket.generation, "Ignoring stale envelope build");
                    return SessionUpdate::StaleResultIgnored;
                }
                self.accept_build(build)
            }
            TimelineEvent::EnvelopeFailed { ticket, message } => {
                if !self.is_current(&ticket) {
                    debug!(asset = %ticket.asset.as_str(), "Ignoring stale build failure");
                    return SessionUpdate::StaleResultIgnored;
                }
                warn!(asset = %ticket.asset.as_str(), "{}", message);
                SessionUpdate::LoadFailed { message }
            }
            TimelineEvent::PlaybackPositionChanged { time_seconds } => {
                let progress = self
                    .clock
                    .on_time_update(time_seconds, &mut self.viewport, &self.envelope);
                SessionUpdate::Progress(progress)
            }
            TimelineEvent::PlaybackStateChanged(state) => {
                self.clock.set_state(state);
                SessionUpdate::Unchanged
            }
            TimelineEvent::ViewportDrag { active } => {
                self.clock.set_user_dragging(active);
                SessionUpdate::Unchanged
            }
        }
    }

    /// Tear down; later events and loads are ignored
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            info!("Timeline session closed");
        }
        self.state = SessionState::Closed;
        self.asset = None;
        self.envelope = WaveformEnvelope::default();
        self.build_status = None;
    }

    fn is_current(&self, ticket: &BuildTicket) -> bool {
        ticket.generation == self.generation
            && self.asset.as_ref().map(|a| a.key()) == Some(ticket.asset.clone())
    }

    fn accept_build(&mut self, build: EnvelopeBuild) -> SessionUpdate {
        if let Some(asset) = self.asset.as_mut() {
            asset.duration_seconds = build.duration_seconds;
        }
        self.viewport.set_duration(build.duration_seconds);
        self.envelope = build.envelope;
        self.build_status = Some(build.status.clone());
        self.state = SessionState::Ready;

        SessionUpdate::DurationReported {
            duration_seconds: build.duration_seconds,
            status: build.status,
        }
    }

    // === Pull accessors for the rendering surface ===

    pub fn asset(&self) -> Option<&AudioAsset> {
        self.asset.as_ref()
    }

    pub fn envelope(&self) -> &WaveformEnvelope {
        &self.envelope
    }

    pub fn build_status(&self) -> Option<&BuildStatus> {
        self.build_status.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn visible_slice(&self) -> Range<usize> {
        self.viewport.visible_slice(&self.envelope)
    }

    pub fn marker_positions(&self, markers: &[Marker]) -> Vec<MarkerPosition> {
        self.viewport.marker_positions(markers)
    }

    pub fn progress(&self) -> ProgressState {
        self.clock.snapshot(&self.viewport, &self.envelope)
    }

    /// Viewport controller for user-driven zoom/scroll
    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn viewport_controller(&self) -> &ViewportController {
        &self.viewport
    }
}
