//! Mixnote timeline tool - command-line entry point
//!
//! Thin wrapper over the `mixnote_timeline` library used by surrounding
//! tooling and for manual verification:
//! - `envelope`: build a waveform envelope and print a JSON summary
//! - `export`: bundle a JSON job description into a directory
//! - `probe`: look for exported markers inside a third-party session file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mixnote_common::config::TomlConfig;
use mixnote_common::RandomIds;
use mixnote_timeline::envelope::{EnvelopeBuilder, SymphoniaDecoder};
use mixnote_timeline::export::{Bundler, CapabilityFlags, ExportFormat, ExportJob};
use mixnote_timeline::fetch::RoutingFetcher;
use mixnote_timeline::markers::Annotation;
use mixnote_timeline::probe;
use mixnote_timeline::{AudioAsset, BuildStatus};

/// Command-line arguments for mixnote-timeline
#[derive(Parser, Debug)]
#[command(name = "mixnote-timeline")]
#[command(about = "Audio timeline engine: envelopes, DAW export, session probe")]
#[command(version)]
struct Args {
    /// Configuration file (overrides MIXNOTE_CONFIG and the default location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a waveform envelope and print a JSON summary
    Envelope {
        /// URL or path of the audio
        #[arg(long)]
        audio: String,

        /// Provisional duration in seconds (used if decoding fails)
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
    },

    /// Bundle an export job into a directory
    Export {
        /// JSON job description
        #[arg(long)]
        job: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = FormatArg::All)]
        format: FormatArg,
    },

    /// Search a session file for marker labels and positions
    Probe {
        /// Session file to inspect
        #[arg(long)]
        session: PathBuf,

        /// Marker label to look for (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Sample rate used to interpret candidate positions
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,

        /// Session to diff against
        #[arg(long)]
        compare: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Reaper,
    Aaf,
    All,
}

impl FormatArg {
    fn formats(self) -> Vec<ExportFormat> {
        match self {
            FormatArg::Reaper => vec![ExportFormat::Reaper],
            FormatArg::Aaf => vec![ExportFormat::AafXml],
            FormatArg::All => ExportFormat::ALL.to_vec(),
        }
    }
}

/// Export job description read by the `export` subcommand
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JobFile {
    title: String,
    #[serde(default)]
    sample_rate_hz: Option<u32>,
    asset: AudioAsset,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    capability_flags: CapabilityFlags,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolved before tracing exists; the outcome is logged after init
    let (config, config_source) =
        TomlConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;

    // Optional log file, in addition to stderr
    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "mixnote_timeline={level},mixnote_common={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    config_source.log();

    let result = match args.command {
        Command::Envelope { audio, duration } => run_envelope(&config, audio, duration).await,
        Command::Export { job, out, format } => run_export(&config, &job, &out, format).await,
        Command::Probe {
            session,
            labels,
            sample_rate,
            compare,
        } => run_probe(&session, &labels, sample_rate, compare.as_deref()).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run_envelope(config: &TomlConfig, audio: String, duration: f64) -> Result<()> {
    let fetcher = Arc::new(RoutingFetcher::new(&config.http).context("Failed to create HTTP client")?);
    let builder = EnvelopeBuilder::new(fetcher, Arc::new(SymphoniaDecoder), config.envelope.clone());

    let original_file_name = audio
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(audio.as_str())
        .to_string();
    let asset = AudioAsset {
        source_location: audio,
        duration_seconds: duration,
        sample_rate_hz: 0,
        channel_count: 2,
        original_file_name,
        bits_per_sample: None,
    };

    let build = builder
        .build(&asset)
        .await
        .map_err(|e| anyhow::anyhow!(mixnote_timeline::envelope::builder::describe_failure(&e)))?;

    let (status, reason) = match &build.status {
        BuildStatus::Decoded => ("decoded", None),
        BuildStatus::Degraded { reason } => ("degraded", Some(reason.clone())),
    };
    let summary = json!({
        "location": asset.source_location,
        "durationSeconds": build.duration_seconds,
        "slices": build.envelope.len(),
        "status": status,
        "reason": reason,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_export(config: &TomlConfig, job_path: &Path, out: &Path, format: FormatArg) -> Result<()> {
    let text = tokio::fs::read_to_string(job_path)
        .await
        .with_context(|| format!("Failed to read job file {}", job_path.display()))?;
    let job_file: JobFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid job file {}", job_path.display()))?;

    let sample_rate = job_file.sample_rate_hz.unwrap_or(job_file.asset.sample_rate_hz);
    let job = ExportJob::from_annotations(
        &job_file.title,
        sample_rate,
        &job_file.annotations,
        job_file.capability_flags,
        &config.export,
    );

    let fetcher = Arc::new(RoutingFetcher::new(&config.http).context("Failed to create HTTP client")?);
    let bundler = Bundler::new(fetcher, config.export.clone());
    let bundle = bundler
        .bundle(&job, &job_file.asset, &format.formats(), &mut RandomIds::new())
        .await
        .context("Export failed")?;

    let written = bundle
        .write_to_dir(out)
        .await
        .with_context(|| format!("Failed to write bundle to {}", out.display()))?;

    for path in &written {
        println!("{}", path.display());
    }
    info!(
        files = written.len(),
        skipped_voice_notes = bundle.skipped_count(),
        "Export written to {}",
        out.display()
    );
    Ok(())
}

async fn run_probe(session: &Path, labels: &[String], sample_rate: u32, compare: Option<&Path>) -> Result<()> {
    let bytes = tokio::fs::read(session)
        .await
        .with_context(|| format!("Failed to read session file {}", session.display()))?;

    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let matches = probe::find_labels(&bytes, &label_refs);
    let strings = probe::printable_strings(&bytes, probe::DEFAULT_MIN_STRING_LEN);
    let positions = probe::candidate_sample_positions(&bytes, sample_rate, 10.0..300.0);

    let difference = match compare {
        Some(other) => {
            let other_bytes = tokio::fs::read(other)
                .await
                .with_context(|| format!("Failed to read session file {}", other.display()))?;
            Some(probe::first_difference(&bytes, &other_bytes))
        }
        None => None,
    };

    let report = json!({
        "session": session.display().to_string(),
        "size": bytes.len(),
        "labels": matches,
        "stringCount": strings.len(),
        "strings": strings.iter().take(20).collect::<Vec<_>>(),
        "samplePositions": positions.iter().take(10).collect::<Vec<_>>(),
        "difference": difference,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
