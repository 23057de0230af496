//! Clusters-per-group buckets and ASCII table formatting
//!
//! This module provides:
//! - [`Bucket`], the ordinal legend category derived from `ClustersPerGroup`
//! - [`bucketize`], which fills in the bucket of every row of a [`ClusterTable`]
//! - [`metric_bucket_entries`] and [`format_bucket_table`], the per-metric
//!   bucket tables of the text summary, using the [`tabled`] crate

use crate::common::data_structures::{ClusterTable, Metric};
use core::fmt;
use tabled::{Table, Tabled};
use thiserror::Error;

/// Errors that can occur while bucketizing rows
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BucketError {
    #[error("Clusters per group must be at least 1, found {value} in {dataset}")]
    OutOfRange { dataset: String, value: u32 },

    #[error("Clusters of {metric} in bucket {bucket} do not fit in 64 bits")]
    Overflow { metric: Metric, bucket: Bucket },
}

type Result<T> = core::result::Result<T, BucketError>;

/// Number of clusters a single group was split into, capped at `5+`.
///
/// Variant order is the legend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    One,
    Two,
    Three,
    Four,
    FivePlus,
}

impl Bucket {
    /// All buckets in legend order
    pub const ALL: [Bucket; 5] = [
        Bucket::One,
        Bucket::Two,
        Bucket::Three,
        Bucket::Four,
        Bucket::FivePlus,
    ];

    /// Maps a clusters-per-group value onto its bucket; everything from 5 up collapses into `5+`.
    ///
    /// Returns `None` for 0, which no real group can have.
    pub fn from_clusters_per_group(value: u32) -> Option<Self> {
        match value {
            0 => None,
            1 => Some(Bucket::One),
            2 => Some(Bucket::Two),
            3 => Some(Bucket::Three),
            4 => Some(Bucket::Four),
            _ => Some(Bucket::FivePlus),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::One => "1",
            Bucket::Two => "2",
            Bucket::Three => "3",
            Bucket::Four => "4",
            Bucket::FivePlus => "5+",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assigns a bucket to every row of the table.
///
/// Fails on the first row whose clusters-per-group value has no bucket.
pub fn bucketize(table: &mut ClusterTable) -> Result<()> {
    for row in &mut table.rows {
        let bucket = Bucket::from_clusters_per_group(row.clusters_per_group()).ok_or_else(|| {
            BucketError::OutOfRange {
                dataset: row.dataset().to_string(),
                value: row.clusters_per_group(),
            }
        })?;
        row.set_bucket(bucket);
    }

    Ok(())
}

/// Distinct buckets present in the table, in legend order
pub fn present_buckets(table: &ClusterTable) -> Vec<Bucket> {
    let mut seen = [false; Bucket::ALL.len()];
    for bucket in table.rows.iter().filter_map(|row| row.bucket()) {
        seen[bucket as usize] = true;
    }

    Bucket::ALL
        .into_iter()
        .filter(|bucket| seen[*bucket as usize])
        .collect()
}

/// One line of a metric's bucket table: a bucket, its summed clusters, and its share
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct BucketEntry {
    #[tabled(rename = "Clusters per KOG")]
    pub bucket: Bucket,
    /// Sum of `ClusterCount` over the metric's rows in this bucket
    #[tabled(rename = "Clusters")]
    pub clusters: u64,
    /// Share of the metric's clusters, formatted as a percentage
    #[tabled(rename = "Percentage")]
    pub percentage: String,
}

impl BucketEntry {
    /// Creates an entry whose percentage is `clusters` out of `total`
    pub fn new(bucket: Bucket, clusters: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            "0.00%".to_string()
        } else {
            format!("{:.2}%", (clusters as f64 / total as f64) * 100.0)
        };

        Self {
            bucket,
            clusters,
            percentage,
        }
    }
}

/// Sums the clusters of one metric per bucket, across every dataset and inflation
///
/// # Arguments
/// * `table` - Bucketized table; rows without a bucket are skipped
/// * `metric` - Metric whose rows are summed
///
/// # Returns
/// One [`BucketEntry`] per bucket in legend order, including empty buckets, or
/// [`BucketError::Overflow`] when a sum exceeds `u64`
pub fn metric_bucket_entries(table: &ClusterTable, metric: Metric) -> Result<Vec<BucketEntry>> {
    let overflow = |bucket| BucketError::Overflow { metric, bucket };

    let mut sums = [0u64; Bucket::ALL.len()];
    for row in table.rows.iter().filter(|row| row.metric() == metric) {
        if let Some(bucket) = row.bucket() {
            let sum = &mut sums[bucket as usize];
            *sum = sum
                .checked_add(row.cluster_count())
                .ok_or_else(|| overflow(bucket))?;
        }
    }

    let mut total = 0u64;
    for bucket in Bucket::ALL {
        total = total
            .checked_add(sums[bucket as usize])
            .ok_or_else(|| overflow(bucket))?;
    }

    Ok(Bucket::ALL
        .into_iter()
        .map(|bucket| BucketEntry::new(bucket, sums[bucket as usize], total))
        .collect())
}

/// Formats a metric's bucket entries as an ASCII table using the [`tabled`] crate
///
/// # Arguments
/// * `metric` - Metric the entries were summed for; its name titles the table
/// * `entries` - Entries from [`metric_bucket_entries`]
///
/// # Returns
/// The titled table, or a titled note when the metric has no clusters at all
pub fn format_bucket_table(metric: Metric, entries: &[BucketEntry]) -> String {
    let title = metric.name();
    let underline = "=".repeat(title.len());

    if entries.iter().all(|entry| entry.clusters == 0) {
        return format!("{title}\n{underline}\nNo {title} rows in any dataset");
    }
    format!("{title}\n{underline}\n{}", Table::new(entries))
}
