//! Configuration loading with graceful degradation
//!
//! Resolution order:
//! 1. Explicit path (command-line argument)
//! 2. `MIXNOTE_CONFIG` environment variable
//! 3. Platform config file (`<config dir>/mixnote/config.toml`)
//! 4. Built-in defaults
//!
//! A missing platform config file is not an error: a warning is logged and
//! built-in defaults are used. A file named explicitly (1 or 2) must exist
//! and parse.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MIXNOTE_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub envelope: EnvelopeConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Envelope builder settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EnvelopeConfig {
    /// Decode timeout; expiry is treated as a decode failure
    #[serde(default = "default_decode_timeout_ms")]
    pub decode_timeout_ms: u64,

    /// Fallback envelope length when the asset has no provisional duration
    #[serde(default = "default_fallback_duration_seconds")]
    pub fallback_duration_seconds: f64,
}

/// Export bundler settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Pause between sequential voice-note fetches
    #[serde(default = "default_voice_fetch_delay_ms")]
    pub voice_fetch_delay_ms: u64,

    /// Voice-note item length when the real duration is unknown
    #[serde(default = "default_voice_duration_seconds")]
    pub default_voice_duration_seconds: f64,

    /// Bit depth written to source descriptors when the asset has none
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,
}

/// HTTP fetch settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_decode_timeout_ms() -> u64 {
    15_000
}

fn default_fallback_duration_seconds() -> f64 {
    60.0
}

fn default_voice_fetch_delay_ms() -> u64 {
    250
}

fn default_voice_duration_seconds() -> f64 {
    10.0
}

fn default_bits_per_sample() -> u16 {
    24
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("Mixnote/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            decode_timeout_ms: default_decode_timeout_ms(),
            fallback_duration_seconds: default_fallback_duration_seconds(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            voice_fetch_delay_ms: default_voice_fetch_delay_ms(),
            default_voice_duration_seconds: default_voice_duration_seconds(),
            bits_per_sample: default_bits_per_sample(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl EnvelopeConfig {
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.decode_timeout_ms)
    }
}

impl ExportConfig {
    pub fn voice_fetch_delay(&self) -> Duration {
        Duration::from_millis(self.voice_fetch_delay_ms)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file (must exist)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration following the documented priority order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (config, source) = Self::resolve(explicit)?;
        source.log();
        Ok(config)
    }

    /// Like [`TomlConfig::load`], but returns where the configuration came
    /// from instead of logging it
    ///
    /// Binaries call this before the tracing subscriber exists and log the
    /// [`ConfigSource`] once it does.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, ConfigSource::File(path.to_path_buf())));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                let path = PathBuf::from(path);
                return Ok((Self::from_file(&path)?, ConfigSource::File(path)));
            }
        }

        match default_config_path() {
            Some(path) if path.exists() => Ok((Self::from_file(&path)?, ConfigSource::File(path))),
            Some(path) => Ok((Self::default(), ConfigSource::DefaultFileMissing(path))),
            None => Ok((Self::default(), ConfigSource::NoConfigDir)),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.envelope.decode_timeout_ms == 0 {
            return Err(Error::Config(
                "envelope.decode_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if !(self.envelope.fallback_duration_seconds >= 0.0) {
            return Err(Error::Config(
                "envelope.fallback_duration_seconds must be non-negative".to_string(),
            ));
        }
        if !(self.export.default_voice_duration_seconds > 0.0) {
            return Err(Error::Config(
                "export.default_voice_duration_seconds must be positive".to_string(),
            ));
        }
        if self.export.bits_per_sample == 0 {
            return Err(Error::Config(
                "export.bits_per_sample must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where a resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicit path or `MIXNOTE_CONFIG`, or an existing platform file
    File(PathBuf),
    /// Platform file absent; built-in defaults in use
    DefaultFileMissing(PathBuf),
    /// No platform config directory; built-in defaults in use
    NoConfigDir,
}

impl ConfigSource {
    /// Report the resolution outcome through tracing
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::DefaultFileMissing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using built-in defaults")
            }
        }
    }
}

/// Platform config file location (`~/.config/mixnote/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mixnote").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.envelope.decode_timeout(), Duration::from_secs(15));
        assert_eq!(config.export.default_voice_duration_seconds, 10.0);
        assert_eq!(config.export.voice_fetch_delay(), Duration::from_millis(250));
        assert!(config.http.user_agent.starts_with("Mixnote/"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [export]
            voice_fetch_delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.export.voice_fetch_delay_ms, 0);
        assert_eq!(config.export.bits_per_sample, 24);
        assert_eq!(config.envelope, EnvelopeConfig::default());
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        assert_eq!(TomlConfig::from_toml_str("").unwrap(), TomlConfig::default());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = TomlConfig::from_toml_str("[envelope]\ndecode_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = TomlConfig::from_toml_str("[export\nvoice_fetch_delay_ms = ").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
