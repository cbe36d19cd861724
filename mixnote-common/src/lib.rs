//! # Mixnote Common Library
//!
//! Shared code for the Mixnote timeline crates including:
//! - Error type shared across crates
//! - TOML configuration loading with graceful degradation
//! - Identifier generation for exported project files
//! - Timecode formatting helpers

pub mod config;
pub mod error;
pub mod ids;
pub mod time;

pub use error::{Error, Result};
pub use ids::{IdGenerator, Identifier, RandomIds, SequentialIds};
