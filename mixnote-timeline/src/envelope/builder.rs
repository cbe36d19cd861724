//! Envelope builder: fetch → decode → envelope
//!
//! Failure policy:
//! - Primary fetch failure is fatal ([`Error::PrimaryFetch`]).
//! - Decode failure or timeout is not: a synthetic envelope is returned
//!   with [`BuildStatus::Degraded`] so rendering never has to cope with a
//!   missing waveform.

use mixnote_common::config::EnvelopeConfig;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{AudioDecoder, BuildStatus, EnvelopeBuild, WaveformEnvelope};
use crate::asset::AudioAsset;
use crate::error::{Error, Result};
use crate::fetch::AudioFetcher;

/// Turns an audio asset into a [`WaveformEnvelope`] plus authoritative duration
pub struct EnvelopeBuilder {
    fetcher: Arc<dyn AudioFetcher>,
    decoder: Arc<dyn AudioDecoder>,
    config: EnvelopeConfig,
}

impl EnvelopeBuilder {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        decoder: Arc<dyn AudioDecoder>,
        config: EnvelopeConfig,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            config,
        }
    }

    /// Build the envelope for `asset`
    ///
    /// Every successful return carries the duration exactly once; a rebuild
    /// reports it again.
    pub async fn build(&self, asset: &AudioAsset) -> Result<EnvelopeBuild> {
        let location = asset.source_location.as_str();
        debug!(location = %location, "Building envelope");

        let bytes = self.fetcher.fetch(location).await.map_err(|e| {
            error!(location = %location, error = %e, "Primary audio fetch failed");
            e.into_primary()
        })?;

        let decoded = tokio::time::timeout(
            self.config.decode_timeout(),
            self.decoder.decode(bytes, asset.extension()),
        )
        .await;

        let build = match decoded {
            Ok(Ok(audio)) => {
                let duration_seconds = audio.duration_seconds();
                let envelope = WaveformEnvelope::from_samples(audio.first_channel(), duration_seconds);
                info!(
                    location = %location,
                    slices = envelope.len(),
                    duration_seconds = format!("{:.2}", duration_seconds),
                    "Envelope built"
                );
                EnvelopeBuild {
                    asset: asset.key(),
                    envelope,
                    duration_seconds,
                    status: BuildStatus::Decoded,
                }
            }
            Ok(Err(e)) => self.degraded(asset, e.to_string()),
            Err(_) => self.degraded(
                asset,
                format!(
                    "Decode timed out after {} ms",
                    self.config.decode_timeout_ms
                ),
            ),
        };

        Ok(build)
    }

    fn degraded(&self, asset: &AudioAsset, reason: String) -> EnvelopeBuild {
        let duration_seconds = if asset.duration_seconds.is_finite() && asset.duration_seconds > 0.0 {
            asset.duration_seconds
        } else {
            self.config.fallback_duration_seconds
        };

        warn!(
            location = %asset.source_location,
            reason = %reason,
            duration_seconds,
            "Decode failed, using fallback envelope"
        );

        let envelope = WaveformEnvelope::fallback(duration_seconds, &mut rand::thread_rng());
        EnvelopeBuild {
            asset: asset.key(),
            envelope,
            duration_seconds,
            status: BuildStatus::Degraded { reason },
        }
    }
}

/// Convenience: map a fatal build error into its human-readable summary
pub fn describe_failure(error: &Error) -> String {
    match error {
        Error::PrimaryFetch { location, reason } => {
            format!("Could not load audio from {} ({})", location, reason)
        }
        other => other.to_string(),
    }
}
