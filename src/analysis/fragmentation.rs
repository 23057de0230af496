//! Fragmentation reports
//!
//! This module provides the text summary and the group totals export that
//! accompany the chart.

use crate::analysis::aggregate::{group_totals, AggregateError};
use crate::common::buckets::{format_bucket_table, metric_bucket_entries, BucketError};
use crate::common::data_structures::{ClusterTable, Dataset, Metric};
use log::info;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize totals: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to sum buckets: {0}")]
    Bucket(#[from] BucketError),

    #[error("Failed to sum groups: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Cluster total of {0} does not fit in 64 bits")]
    Overflow(Dataset),
}

type Result<T> = core::result::Result<T, ReportError>;

/// Builds the text summary: one bucket table per metric, then per-dataset totals
pub fn format_fragmentation_summary(table: &ClusterTable, datasets: &[Dataset]) -> Result<String> {
    let tables = Metric::ALL
        .iter()
        .map(|metric| -> Result<String> {
            let entries = metric_bucket_entries(table, *metric)?;
            Ok(format_bucket_table(*metric, &entries))
        })
        .collect::<Result<Vec<String>>>()?;

    let dataset_lines = datasets
        .iter()
        .map(|dataset| -> Result<String> {
            let (rows, clusters) = table
                .rows_for(dataset)
                .try_fold((0usize, 0u64), |(rows, clusters), row| {
                    Some((rows + 1, clusters.checked_add(row.cluster_count())?))
                })
                .ok_or_else(|| ReportError::Overflow(dataset.clone()))?;
            Ok(format!("{dataset}: {rows} rows, {clusters} clusters"))
        })
        .collect::<Result<Vec<String>>>()?;

    Ok(format!(
        "Cluster Fragmentation Summary\n{}\n\n{}\n\nDatasets\n{}\n{}\nTotal rows: {}",
        "=".repeat(29),
        tables.join("\n\n"),
        "=".repeat(8),
        dataset_lines.join("\n"),
        table.len()
    ))
}

/// Writes the text summary to `output_path`
pub fn generate_fragmentation_summary(
    table: &ClusterTable,
    datasets: &[Dataset],
    output_path: &Path,
) -> Result<()> {
    let summary = format_fragmentation_summary(table, datasets)?;
    fs::write(output_path, &summary)?;
    info!("Wrote summary to {}", output_path.display());
    Ok(())
}

/// Writes the per-(metric, inflation) cluster totals as pretty-printed JSON
pub fn write_group_totals_json(table: &ClusterTable, output_path: &Path) -> Result<()> {
    let totals = group_totals(table)?;
    let json = serde_json::to_string_pretty(&totals)?;
    fs::write(output_path, json)?;
    info!(
        "Wrote {} group totals to {}",
        totals.len(),
        output_path.display()
    );
    Ok(())
}
