//! # eck-fragmentation
//!
//! Renders how strongly the clusters produced for synthetic ECK benchmarks are
//! fragmented, across datasets, scoring metrics and inflation values.
//!
//! The pipeline is strictly linear:
//! load ([`parsing`]) → order metrics → aggregate ([`analysis`]) → bucketize →
//! build palette → render ([`common::plots`]).

pub mod analysis;
pub mod common;
pub mod parsing;

pub use common::{Bucket, ClusterRow, ClusterTable, Dataset, Metric};

use analysis::constants::{
    DEFAULT_BASE_DIR, DEFAULT_BIN_WIDTH, DEFAULT_DATASET_IDS, DEFAULT_OUTPUT_FILE,
};
use analysis::{attach_group_totals, generate_fragmentation_summary, write_group_totals_json};
use common::buckets::{bucketize, present_buckets};
use common::palette::Palette;
use common::plots::{render_pdf, FacetGrid};
use log::info;
use parsing::{load_datasets, order_metrics};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during a run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parsing error: {0}")]
    Parsing(#[from] parsing::ParsingError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] analysis::AggregateError),

    #[error("Bucketing error: {0}")]
    Bucket(#[from] common::BucketError),

    #[error("Palette error: {0}")]
    Palette(#[from] common::PaletteError),

    #[error("Plot error: {0}")]
    Plot(#[from] common::PlotError),

    #[error("Report error: {0}")]
    Report(#[from] analysis::ReportError),
}

type Result<T> = core::result::Result<T, AnalysisError>;

/// Inputs of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the `eck_<id>` dataset folders
    pub base_dir: PathBuf,
    /// Datasets to load, in chart row order
    pub datasets: Vec<Dataset>,
    /// Path of the PDF chart
    pub output: PathBuf,
    /// Width of an inflation bin
    pub bin_width: f64,
    /// Optional text summary
    pub summary: Option<PathBuf>,
    /// Optional JSON export of the per-(metric, inflation) totals
    pub totals_json: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            datasets: DEFAULT_DATASET_IDS.iter().map(|id| Dataset::new(*id)).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            bin_width: DEFAULT_BIN_WIDTH,
            summary: None,
            totals_json: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            return Err(AnalysisError::Config("at least one dataset is required".to_string()));
        }
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(AnalysisError::Config(format!(
                "bin width must be a positive number, got {}",
                self.bin_width
            )));
        }
        Ok(())
    }
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    pub buckets: Vec<Bucket>,
    pub output: PathBuf,
}

/// Runs the whole pipeline for `config`, writing the chart and any requested reports
///
/// # Arguments
/// * `config` - Inputs, output paths and bin width of the run
///
/// # Returns
/// A [`RunSummary`] once the chart has been written. Reports are only written
/// after the chart, so a failed run leaves no report behind it.
pub fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;

    let raw = load_datasets(&config.base_dir, &config.datasets)?;
    info!(
        "Loaded {} rows from {} datasets",
        raw.len(),
        config.datasets.len()
    );

    let mut table = order_metrics(raw)?;
    attach_group_totals(&mut table)?;
    bucketize(&mut table)?;

    let buckets = present_buckets(&table);
    let palette = Palette::for_buckets(&buckets)?;
    info!(
        "Buckets present: {}",
        buckets
            .iter()
            .map(|bucket| bucket.label())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let grid = FacetGrid::build(&table, &config.datasets, config.bin_width)?;
    render_pdf(&grid, &palette, &config.output)?;

    if let Some(path) = &config.summary {
        generate_fragmentation_summary(&table, &config.datasets, path)?;
    }
    if let Some(path) = &config.totals_json {
        write_group_totals_json(&table, path)?;
    }

    Ok(RunSummary {
        rows: table.len(),
        buckets,
        output: config.output.clone(),
    })
}
