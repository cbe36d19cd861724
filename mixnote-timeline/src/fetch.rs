//! Audio byte-stream fetching
//!
//! Audio is owned by an external storage collaborator and referenced by
//! location (HTTP(S) URL, `file://` URL or plain path). Every fetch is a
//! suspension point; nothing here retries.

use async_trait::async_trait;
use mixnote_common::config::HttpConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Capability to retrieve audio bytes by location
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Fetch the complete byte stream at `location`
    ///
    /// Failures are reported as [`Error::Fetch`]; callers decide whether a
    /// failure is fatal.
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// HTTP(S) fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Fetch {
                location: String::new(),
                reason: format!("HTTP client setup failed: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        debug!(location = %location, "Fetching audio over HTTP");

        let fail = |reason: String| Error::Fetch {
            location: location.to_string(),
            reason,
        };

        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP status {}", status.as_u16())));
        }

        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        debug!(location = %location, bytes = bytes.len(), "HTTP fetch complete");
        Ok(bytes.to_vec())
    }
}

/// Local filesystem fetcher (plain paths and `file://` URLs)
#[derive(Debug, Default, Clone)]
pub struct FileFetcher;

impl FileFetcher {
    fn resolve(location: &str) -> PathBuf {
        PathBuf::from(location.strip_prefix("file://").unwrap_or(location))
    }
}

#[async_trait]
impl AudioFetcher for FileFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let path = Self::resolve(location);
        debug!(path = %path.display(), "Reading audio file");
        tokio::fs::read(&path).await.map_err(|e| Error::Fetch {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Dispatches on location scheme: `http(s)://` over HTTP, everything else from disk
pub struct RoutingFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl RoutingFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: HttpFetcher::new(config)?,
            file: FileFetcher,
        })
    }
}

fn is_http(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl AudioFetcher for RoutingFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if is_http(location) {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }
}

/// In-memory fetcher for pre-loaded assets
///
/// Records every requested location in order; unknown locations fail.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.entries.insert(location.into(), bytes);
        self
    }

    /// Locations requested so far, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AudioFetcher for MemoryFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(location.to_string());
        }
        self.entries.get(location).cloned().ok_or_else(|| Error::Fetch {
            location: location.to_string(),
            reason: "not found".to_string(),
        })
    }
}
