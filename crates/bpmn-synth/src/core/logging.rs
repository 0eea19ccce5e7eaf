//! Logging infrastructure for the synthesis pipeline
//!
//! Every stage emits `tracing` spans and events; this module installs a
//! `tracing-subscriber` registry that prints them to stderr, leaving stdout
//! to the CLI's document output.
//!
//! ```rust,no_run
//! use bpmn_synth::core::logging::init_logging;
//!
//! init_logging(Some("debug"), Some("pretty")).unwrap();
//! ```
//!
//! Resolution order for the level is the explicit argument, then
//! `BPMN_SYNTH_LOG_LEVEL`, then `RUST_LOG`, then `info`. The format comes from
//! the argument, then `BPMN_SYNTH_LOG_FORMAT`, then `compact`.
//!
//! Per-stage filtering uses the usual directive syntax:
//!
//! ```bash
//! RUST_LOG="info,bpmn_synth::plugins::bpmn::normalizer=trace" bpmn-synth convert -i process.json
//! ```

use std::str::FromStr;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Environment variable consulted for the log level
pub const LEVEL_ENV: &str = "BPMN_SYNTH_LOG_LEVEL";

/// Environment variable consulted for the log format
pub const FORMAT_ENV: &str = "BPMN_SYNTH_LOG_FORMAT";

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line format
    #[default]
    Compact,
    /// Pretty multi-line format with colors
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl LogFormat {
    /// Get all valid format names
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }
}

fn resolve_level(level: Option<&str>) -> String {
    level
        .map(str::to_string)
        .or_else(|| std::env::var(LEVEL_ENV).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string())
}

fn resolve_format(format: Option<&str>) -> Result<LogFormat, String> {
    match format
        .map(str::to_string)
        .or_else(|| std::env::var(FORMAT_ENV).ok())
    {
        Some(name) => LogFormat::from_str(&name),
        None => Ok(LogFormat::default()),
    }
}

fn build_filter(level: &str) -> EnvFilter {
    if level == "off" {
        return EnvFilter::new("off");
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber
///
/// Fails if the format name is unknown or a global subscriber is already set.
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_filter(&resolve_level(level));
    let format = resolve_format(format).map_err(|e| format!("Invalid log format: {}", e))?;

    let registry = Registry::default().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .compact()
                    .with_target(false)
                    .with_span_events(FmtSpan::NONE),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .pretty()
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?,
    }

    Ok(())
}

/// Initialize logging with default settings (info level, compact format)
pub fn init_default_logging() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(None, None)
}
