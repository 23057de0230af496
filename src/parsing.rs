//! Loading of the per-dataset `clusters_per_kog_summary.Rtab` tables
//!
//! This module handles:
//! - Building the fixed path of each dataset's summary table
//! - Parsing the whitespace-delimited tables written by R's `write.table`
//! - Validating the free-text metric column into [`Metric`]

use crate::common::data_structures::{ClusterRow, ClusterTable, Dataset, Metric, RawRow, RawTable};
use core::str::FromStr;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during table loading
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("No datasets were given")]
    NoDatasets,

    #[error("Failed to read input file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: file has no header row")]
    MissingHeader { path: PathBuf },

    #[error("{path}: header is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}:{line}: expected {expected} fields, found {found}")]
    FieldCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path}:{line}: invalid {column} value '{value}'")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Unrecognised metric '{metric}' in {dataset}")]
    UnknownMetric { dataset: Dataset, metric: String },
}

type Result<T> = core::result::Result<T, ParsingError>;

const METRIC_COLUMN: &str = "Metric";
const INFLATION_COLUMN: &str = "Inflation";
const CLUSTER_COUNT_COLUMN: &str = "ClusterCount";
/// Header names accepted for the clusters-per-group column
const CLUSTERS_PER_GROUP_COLUMNS: [&str; 2] = ["ClustersPerKOG", "ClustersPerGroup"];

/// Path of a dataset's summary table below `base_dir`
pub fn summary_table_path(base_dir: &Path, dataset: &Dataset) -> PathBuf {
    let prefix = format!("eck_{}", dataset.id());
    base_dir
        .join(&prefix)
        .join("shf_rnd")
        .join("1e-5")
        .join("nrm_dmnd")
        .join(format!(
            "{prefix}_shf_rnd_1e-5_nrm_dmnd_clusters_per_kog_summary.Rtab"
        ))
}

/// Loads every dataset's summary table and concatenates them in the given order.
///
/// # Arguments
/// * `base_dir` - Directory holding the `eck_<id>` dataset folders
/// * `datasets` - Datasets to load; each file's rows are tagged with its dataset
///
/// # Returns
/// The row-wise union of all tables, preserving row order within each file.
/// Any missing or malformed table aborts the whole load, so no partial table
/// is ever returned.
pub fn load_datasets(base_dir: &Path, datasets: &[Dataset]) -> Result<RawTable> {
    if datasets.is_empty() {
        return Err(ParsingError::NoDatasets);
    }

    datasets.iter().try_fold(RawTable::default(), |mut table, dataset| {
        let path = summary_table_path(base_dir, dataset);
        let rows = load_summary_table(&path, dataset)?;
        if rows.is_empty() {
            warn!("{} has no rows: {}", dataset, path.display());
        }
        info!("Loaded {} rows for {}", rows.len(), dataset);
        table.rows.extend(rows);
        Ok(table)
    })
}

/// Reads a single summary table, tagging each row with `dataset`
pub fn load_summary_table(path: &Path, dataset: &Dataset) -> Result<Vec<RawRow>> {
    let text = fs::read_to_string(path).map_err(|source| ParsingError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_summary_table(&text, path, dataset)
}

/// Column positions of the fields we use, resolved from the header
struct ColumnIndices {
    metric: usize,
    inflation: usize,
    cluster_count: usize,
    clusters_per_group: usize,
    width: usize,
}

impl ColumnIndices {
    fn from_header(header: &[&str], path: &Path) -> Result<Self> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| ParsingError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };

        let clusters_per_group = CLUSTERS_PER_GROUP_COLUMNS
            .iter()
            .find_map(|column| header.iter().position(|name| name == column))
            .ok_or_else(|| ParsingError::MissingColumn {
                path: path.to_path_buf(),
                column: CLUSTERS_PER_GROUP_COLUMNS[0],
            })?;

        Ok(Self {
            metric: find(METRIC_COLUMN)?,
            inflation: find(INFLATION_COLUMN)?,
            cluster_count: find(CLUSTER_COUNT_COLUMN)?,
            clusters_per_group,
            width: header.len(),
        })
    }
}

/// Strips the double quotes `write.table` puts around strings
fn unquote(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(field)
}

fn parse_field<T: FromStr>(
    fields: &[&str],
    index: usize,
    column: &'static str,
    path: &Path,
    line: usize,
) -> Result<T> {
    let value = fields[index];
    value.parse().map_err(|_| ParsingError::InvalidValue {
        path: path.to_path_buf(),
        line,
        column,
        value: value.to_string(),
    })
}

/// Parses the text of a summary table.
///
/// The first non-blank line is the header. A data line with exactly one more
/// field than the header carries a leading row name, which is dropped.
pub fn parse_summary_table(text: &str, path: &Path, dataset: &Dataset) -> Result<Vec<RawRow>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or_else(|| ParsingError::MissingHeader {
        path: path.to_path_buf(),
    })?;
    let header: Vec<&str> = header_line.split_whitespace().map(unquote).collect();
    let columns = ColumnIndices::from_header(&header, path)?;

    let mut rows = Vec::new();
    for (line, record) in lines {
        let mut fields: Vec<&str> = record.split_whitespace().map(unquote).collect();
        if fields.len() == columns.width + 1 {
            fields.remove(0);
        }
        if fields.len() != columns.width {
            return Err(ParsingError::FieldCount {
                path: path.to_path_buf(),
                line,
                expected: columns.width,
                found: fields.len(),
            });
        }

        let inflation: f64 = parse_field(&fields, columns.inflation, INFLATION_COLUMN, path, line)?;
        if !inflation.is_finite() {
            return Err(ParsingError::InvalidValue {
                path: path.to_path_buf(),
                line,
                column: INFLATION_COLUMN,
                value: fields[columns.inflation].to_string(),
            });
        }

        rows.push(RawRow {
            dataset: dataset.clone(),
            metric: fields[columns.metric].to_string(),
            inflation,
            cluster_count: parse_field(
                &fields,
                columns.cluster_count,
                CLUSTER_COUNT_COLUMN,
                path,
                line,
            )?,
            clusters_per_group: parse_field(
                &fields,
                columns.clusters_per_group,
                CLUSTERS_PER_GROUP_COLUMNS[0],
                path,
                line,
            )?,
        });
    }

    debug!("Parsed {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Converts the metric column into [`Metric`], failing on any name outside the known four
pub fn order_metrics(raw: RawTable) -> Result<ClusterTable> {
    let rows = raw
        .rows
        .into_iter()
        .map(|row| -> Result<ClusterRow> {
            let metric = Metric::from_str(&row.metric).map_err(|unknown| {
                ParsingError::UnknownMetric {
                    dataset: row.dataset.clone(),
                    metric: unknown.0,
                }
            })?;
            Ok(ClusterRow::new(
                row.dataset,
                metric,
                row.inflation,
                row.cluster_count,
                row.clusters_per_group,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ClusterTable { rows })
}
