//! Export bundler: project files + audio + instructions
//!
//! Order of work:
//! 1. Serialize every requested project format
//! 2. Fetch the primary audio (failure aborts the bundle)
//! 3. If voice notes are allowed, fetch each one sequentially with a pause
//!    between requests; a failed voice note is skipped and recorded
//! 4. Render the instructions document
//!
//! The bundle holds no shared state; concurrent bundles for different
//! projects are independent.

use mixnote_common::config::ExportConfig;
use mixnote_common::time::format_timecode;
use mixnote_common::IdGenerator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::instructions::{self, FileEntry};
use super::{ExportFormat, ExportJob};
use crate::asset::AudioAsset;
use crate::error::Result;
use crate::fetch::AudioFetcher;

/// One deliverable file
#[derive(Debug, Clone, PartialEq)]
pub struct BundleFile {
    /// Suggested file name
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A voice note that could not be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedVoiceNote {
    pub annotation_id: String,
    pub author: String,
    /// Name the project files use for this track
    pub file_name: String,
    pub timestamp_seconds: f64,
    pub location: String,
    pub reason: String,
}

/// Everything produced by one export
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub files: Vec<BundleFile>,
    pub skipped: Vec<SkippedVoiceNote>,
}

impl Bundle {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn file(&self, name: &str) -> Option<&BundleFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Write every file into `dir`, creating it if needed
    pub async fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(&file.name);
            tokio::fs::write(&path, &file.bytes).await?;
            debug!(path = %path.display(), bytes = file.bytes.len(), "Wrote bundle file");
            written.push(path);
        }
        Ok(written)
    }
}

/// Assembles deliverable bundles
pub struct Bundler {
    fetcher: Arc<dyn AudioFetcher>,
    config: ExportConfig,
}

impl Bundler {
    pub fn new(fetcher: Arc<dyn AudioFetcher>, config: ExportConfig) -> Self {
        Self { fetcher, config }
    }

    /// Build the bundle for `job`
    ///
    /// Returns [`crate::Error::PrimaryFetch`] when the primary audio cannot
    /// be fetched. Voice-note failures only show up in [`Bundle::skipped`].
    pub async fn bundle<G: IdGenerator>(
        &self,
        job: &ExportJob,
        asset: &AudioAsset,
        formats: &[ExportFormat],
        ids: &mut G,
    ) -> Result<Bundle> {
        info!(
            title = %job.project_title,
            markers = job.markers.len(),
            voice_notes = job.included_voice_tracks().len(),
            "Starting export bundle"
        );

        let mut bundle = Bundle::default();
        let mut entries = Vec::new();

        for format in formats {
            let name = format.file_name(job);
            let text = format.serialize(job, asset, ids);
            entries.push(FileEntry {
                name: name.clone(),
                description: format.description().to_string(),
            });
            bundle.files.push(BundleFile {
                name,
                bytes: text.into_bytes(),
            });
        }

        let primary_name = asset.bundle_file_name();
        let primary = self
            .fetcher
            .fetch(&asset.source_location)
            .await
            .map_err(|e| {
                error!(location = %asset.source_location, error = %e, "Primary audio fetch failed, aborting bundle");
                e.into_primary()
            })?;
        entries.push(FileEntry {
            name: primary_name.clone(),
            description: "primary audio".to_string(),
        });
        bundle.files.push(BundleFile {
            name: primary_name,
            bytes: primary,
        });

        for (i, voice) in job.included_voice_tracks().iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.voice_fetch_delay()).await;
            }

            match self.fetcher.fetch(&voice.location).await {
                Ok(bytes) => {
                    debug!(file = %voice.file_name, bytes = bytes.len(), "Fetched voice note");
                    entries.push(FileEntry {
                        name: voice.file_name.clone(),
                        description: format!(
                            "voice note by {} at {}",
                            voice.author,
                            format_timecode(voice.timestamp_seconds)
                        ),
                    });
                    bundle.files.push(BundleFile {
                        name: voice.file_name.clone(),
                        bytes,
                    });
                }
                Err(e) => {
                    warn!(
                        annotation_id = %voice.annotation_id,
                        location = %voice.location,
                        error = %e,
                        "Skipping voice note"
                    );
                    bundle.skipped.push(SkippedVoiceNote {
                        annotation_id: voice.annotation_id.clone(),
                        author: voice.author.clone(),
                        file_name: voice.file_name.clone(),
                        timestamp_seconds: voice.timestamp_seconds,
                        location: voice.location.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let instructions_name = format!("{}_IMPORT_INSTRUCTIONS.txt", job.sanitized_title);
        entries.push(FileEntry {
            name: instructions_name.clone(),
            description: "this file".to_string(),
        });
        let text = instructions::render(job, &entries, &bundle.skipped, mixnote_common::time::now());
        bundle.files.push(BundleFile {
            name: instructions_name,
            bytes: text.into_bytes(),
        });

        info!(
            files = bundle.files.len(),
            skipped = bundle.skipped_count(),
            "Export bundle ready"
        );
        Ok(bundle)
    }
}
