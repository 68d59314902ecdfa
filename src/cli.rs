//! CLI argument parsing for adfps

use crate::config::{DuplicatePolicy, MissingSignalPolicy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Operator-facing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Progress lines and "Saved:" confirmations (default)
    Text,
    /// Single JSON run report on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "adfps")]
#[command(version)]
#[command(
    about = "Aggregate per-FPS video signals and derive frame-rate thresholds for audio description",
    long_about = None
)]
pub struct Cli {
    /// Root of the per-video, per-FPS JSON result tree
    #[arg(short, long, value_name = "DIR", default_value = "data/clean_results")]
    pub input: PathBuf,

    /// Directory for the output tables
    #[arg(short, long, value_name = "DIR", default_value = "analysis")]
    pub output: PathBuf,

    /// Analysis configuration (TOML); the embedded default is used otherwise
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Warn when fewer than 90% of this many result files are found
    #[arg(long = "expect-files", value_name = "N")]
    pub expect_files: Option<usize>,

    /// Behaviour for AD-tier signals missing from the data (overrides config)
    #[arg(long = "missing-signal", value_enum, value_name = "POLICY")]
    pub missing_signal: Option<MissingSignalPolicy>,

    /// Behaviour for repeated (video_id, fps) keys (overrides config)
    #[arg(long = "duplicates", value_enum, value_name = "POLICY")]
    pub duplicates: Option<DuplicatePolicy>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
