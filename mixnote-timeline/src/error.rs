//! Error types for mixnote-timeline
//!
//! Decode failures never appear here as a returned error from the envelope
//! builder: they are converted into a degraded build status. Primary audio
//! fetch failures are fatal and carry their own variant so callers can
//! tell them apart.

use thiserror::Error;

/// Main error type for the timeline engine
#[derive(Error, Debug)]
pub enum Error {
    /// Primary audio could not be fetched (fatal to envelope build and bundling)
    #[error("Failed to fetch primary audio from {location}: {reason}")]
    PrimaryFetch { location: String, reason: String },

    /// A single fetch failed (voice notes are skipped, not propagated)
    #[error("Fetch failed for {location}: {reason}")]
    Fetch { location: String, reason: String },

    /// Audio could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// mixnote-common error
    #[error("Common error: {0}")]
    Common(#[from] mixnote_common::Error),
}

impl Error {
    /// Promote a generic fetch failure to the fatal primary-audio kind
    pub fn into_primary(self) -> Self {
        match self {
            Error::Fetch { location, reason } => Error::PrimaryFetch { location, reason },
            other => other,
        }
    }

    pub fn is_fatal_fetch(&self) -> bool {
        matches!(self, Error::PrimaryFetch { .. })
    }
}

/// Convenience Result type using mixnote-timeline Error
pub type Result<T> = std::result::Result<T, Error>;
