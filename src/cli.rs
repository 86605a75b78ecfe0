//! CLI argument parsing for gacha-audit

use crate::distribution::{BandMethod, Metric, View};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for audit reports and comparison series
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "gacha-audit")]
#[command(version)]
#[command(
    about = "Statistical audit of aggregated success rows and simulated outcome distributions",
    long_about = None
)]
pub struct Cli {
    /// Audit a JSON array of per-tier summary rows
    #[arg(long = "rows", value_name = "FILE")]
    pub rows: Option<PathBuf>,

    /// Compare fair and rigged histograms from a simulation JSON file
    #[arg(long = "simulation", value_name = "FILE")]
    pub simulation: Option<PathBuf>,

    /// Load defaults from a TOML configuration file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fill missing dispersion p-values with a chi-square test on the variance ratio
    #[arg(long = "derive-dispersion")]
    pub derive_dispersion: bool,

    /// Metric to compare (with --simulation)
    #[arg(long = "metric", value_enum, default_value = "fail")]
    pub metric: Metric,

    /// Presentation of the comparison (default: tail for cost, hist otherwise)
    #[arg(long = "view", value_enum)]
    pub view: Option<View>,

    /// Trim the histogram view to values where either world reaches this percent
    #[arg(long = "min-prob", value_name = "PCT")]
    pub min_prob: Option<f64>,

    /// Drop values above this before comparing (0 disables)
    #[arg(long = "max-value", value_name = "N")]
    pub max_value: Option<u64>,

    /// Overlay a moment-matched Gaussian on the histogram view
    #[arg(long = "gaussian")]
    pub gaussian: bool,

    /// Confidence band method for the fair series
    #[arg(long = "band", value_enum)]
    pub band: Option<BandMethod>,

    /// Report this quantile (0-1) of both raw histograms; repeatable
    #[arg(long = "percentile", value_name = "Q")]
    pub percentile: Vec<f64>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
