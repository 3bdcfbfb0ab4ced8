//! Command-line parsing for the indicator ingest tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DecimalStyle, MetricOp, NormalizeMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "btab", version, about = "Monthly bank-indicator ingest and analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest the batch, print the run summary, and optionally export.
    Load(LoadArgs),
    /// Print a month leaderboard for one metric.
    Top(TopArgs),
    /// Evaluate a user-composed derived metric for one entity.
    Calc(CalcArgs),
    /// Write a synthetic demo batch (monthly CSVs + roster).
    Sample(SampleArgs),
}

/// Where the batch comes from and how it is normalized.
#[derive(Debug, Parser, Clone)]
pub struct SourceArgs {
    /// Data directory containing the monthly .csv files.
    #[arg(short = 'd', long, default_value = "data")]
    pub data: PathBuf,

    /// Remote folder base URL (expects manifest.txt + per-file GET).
    #[arg(long, conflicts_with = "remote")]
    pub url: Option<String>,

    /// Read the remote folder base URL from BANKTAB_BASE_URL (.env supported).
    #[arg(long)]
    pub remote: bool,

    /// Roster file: TSV without header, columns code/name/alias.
    ///
    /// Tried as given (also relative to the data folder), then the
    /// conventional `Nomina.txt`.
    #[arg(long, default_value = "Nomina.txt")]
    pub roster: String,

    /// Keep aggregate rows (codes starting with "AA").
    #[arg(long)]
    pub include_aggregates: bool,

    /// Prefer the roster alias over the full name for entity labels.
    #[arg(long)]
    pub prefer_alias: bool,

    /// Decimal separator convention for metric cells.
    #[arg(long, value_enum, default_value_t = DecimalStyle::Auto)]
    pub decimal: DecimalStyle,
}

/// Options for `btab load`.
#[derive(Debug, Parser, Clone)]
pub struct LoadArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Export the unified table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Delimiter for --export: ";", "," or "tab".
    #[arg(long, default_value = ";")]
    pub export_delimiter: String,

    /// Export run diagnostics to JSON.
    #[arg(long = "export-report")]
    pub export_report: Option<PathBuf>,
}

/// Options for `btab top`.
#[derive(Debug, Parser, Clone)]
pub struct TopArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Metric column to rank by.
    #[arg(short = 'm', long)]
    pub metric: String,

    /// Reporting month (YYYYMM); defaults to the latest in the batch.
    #[arg(long)]
    pub month: Option<String>,

    /// Number of entities to show.
    #[arg(long, default_value_t = 15)]
    pub top: usize,
}

/// Options for `btab calc`.
#[derive(Debug, Parser, Clone)]
pub struct CalcArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// First operand metric.
    #[arg(long)]
    pub a: String,

    /// Operator between A and B.
    #[arg(long, value_enum, default_value_t = MetricOp::Div)]
    pub op1: MetricOp,

    /// Second operand metric.
    #[arg(long)]
    pub b: String,

    /// Optional second operator (requires --c).
    #[arg(long, value_enum, requires = "c")]
    pub op2: Option<MetricOp>,

    /// Optional third operand metric (requires --op2).
    #[arg(long, requires = "op2")]
    pub c: Option<String>,

    /// Normalization applied to the result series.
    #[arg(long, value_enum, default_value_t = NormalizeMode::Raw)]
    pub normalize: NormalizeMode,

    /// Entity to evaluate (code or label); defaults to the first entity.
    #[arg(short = 'e', long)]
    pub entity: Option<String>,
}

/// Options for `btab sample`.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output directory for the generated batch.
    #[arg(long, default_value = "data")]
    pub out: PathBuf,

    /// Number of monthly files to generate.
    #[arg(long, default_value_t = 6)]
    pub months: usize,

    /// Number of entities per month.
    #[arg(long, default_value_t = 8)]
    pub entities: usize,

    /// Random seed for the generated values.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
