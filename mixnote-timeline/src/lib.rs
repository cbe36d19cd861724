//! # Mixnote Timeline Engine (mixnote-timeline)
//!
//! Audio timeline core for the collaboration product.
//!
//! **Purpose:** Turn an audio asset into a zoomable amplitude envelope kept
//! in sync with playback, and export timestamp-anchored annotations as DAW
//! projects bundled with the referenced audio.
//!
//! **Architecture:**
//! - [`envelope`]: fetch → decode (symphonia) → fixed-rate envelope
//! - [`viewport`] / [`playback`]: time ↔ screen-fraction mapping and auto-follow
//! - [`session`]: per-asset state machine fed by explicit events
//! - [`markers`] → [`export`]: marker translation, REAPER/XML serializers, bundling
//! - [`probe`]: byte-level checks on third-party session files

pub mod asset;
pub mod envelope;
pub mod error;
pub mod export;
pub mod fetch;
pub mod markers;
pub mod playback;
pub mod probe;
pub mod session;
pub mod viewport;

pub use asset::AudioAsset;
pub use envelope::{BuildStatus, EnvelopeBuild, EnvelopeBuilder, WaveformEnvelope};
pub use error::{Error, Result};
pub use export::{Bundle, Bundler, CapabilityFlags, ExportFormat, ExportJob};
pub use markers::{translate, Annotation, Marker};
pub use session::{TimelineEvent, TimelineSession};
pub use viewport::ViewportController;
