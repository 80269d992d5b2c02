//! CLI argument definitions for the formfill tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "formfill",
    version,
    about = "Map extracted document fields onto a form schema",
    long_about = "Assign extracted document data to form fields with calibrated\n\
                  confidence scores. Ambiguous or low-quality input degrades to\n\
                  warnings on a completed result instead of failing the job."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow extracted field values (PII) to appear in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one mapping job from JSON field files.
    Run(RunArgs),

    /// List the supported field types.
    Types,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to a JSON array of extracted source fields.
    #[arg(value_name = "SOURCES")]
    pub sources: PathBuf,

    /// Path to a JSON array of target form fields.
    #[arg(value_name = "TARGETS")]
    pub targets: PathBuf,

    /// Document-type hint selecting a weight profile
    /// (structured, freeform, ...).
    #[arg(long = "document-type", value_name = "HINT")]
    pub document_type: Option<String>,

    /// Directory for job checkpoints (default: .formfill).
    #[arg(long = "checkpoint-dir", value_name = "DIR", default_value = ".formfill")]
    pub checkpoint_dir: PathBuf,

    /// Minimum composite score for a mapping to be accepted.
    #[arg(long = "assignment-threshold", value_name = "SCORE")]
    pub assignment_threshold: Option<f32>,

    /// Minimum composite score for a pair to be considered at all.
    #[arg(long = "candidate-floor", value_name = "SCORE")]
    pub candidate_floor: Option<f32>,

    /// Maximum mapping attempts before degraded finalization.
    #[arg(long = "max-attempts", value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Allow one mapping per (target, source document) instead of one per target.
    #[arg(long = "merge-multi-source")]
    pub merge_multi_source: bool,

    /// Per-stage wall-clock budget in milliseconds.
    #[arg(long = "stage-timeout-ms", value_name = "MS")]
    pub stage_timeout_ms: Option<u64>,

    /// Write the full JSON result to this path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Validate the inputs and print what would run, without executing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
