//! Data structures for the cluster summary tables
//!
//! Rows move through two shapes:
//! - [`RawTable`] holds rows exactly as loaded, with the metric still free text
//! - [`ClusterTable`] holds validated [`ClusterRow`]s, whose loaded fields are
//!   read-only and whose group total and bucket are filled in later
//!
//! [`Dataset`] and [`Metric`] are the row and column keys of the chart.

use crate::common::buckets::Bucket;
use core::fmt;
use core::str::FromStr;
use serde::Serialize;

/// Identifier of a synthetic benchmark dataset (the `<id>` in `eck_<id>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dataset(String);

impl Dataset {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "eck_{}", self.0)
    }
}

/// Scoring metric used to weight the similarity graph before clustering.
///
/// Variant order is the display order of the chart columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Metric {
    #[serde(rename = "E-value")]
    EValue,
    #[serde(rename = "BitScore")]
    BitScore,
    #[serde(rename = "BitScorePerResidue")]
    BitScorePerResidue,
    #[serde(rename = "BitScoreRatio")]
    BitScoreRatio,
}

impl Metric {
    /// All metrics in display order
    pub const ALL: [Metric; 4] = [
        Metric::EValue,
        Metric::BitScore,
        Metric::BitScorePerResidue,
        Metric::BitScoreRatio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::EValue => "E-value",
            Metric::BitScore => "BitScore",
            Metric::BitScorePerResidue => "BitScorePerResidue",
            Metric::BitScoreRatio => "BitScoreRatio",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a metric name is not one of the four known metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    /// Accepts the display names as well as the short codes written by the graph builder
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E-value" | "Evalue" | "evl" => Ok(Metric::EValue),
            "BitScore" | "bit" => Ok(Metric::BitScore),
            "BitScorePerResidue" | "bpr" => Ok(Metric::BitScorePerResidue),
            "BitScoreRatio" | "bsr" => Ok(Metric::BitScoreRatio),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// A row as read from a summary table, before the metric column is validated
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub dataset: Dataset,
    pub metric: String,
    pub inflation: f64,
    pub cluster_count: u64,
    pub clusters_per_group: u32,
}

/// Row-wise union of every dataset's summary table, in load order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One (dataset, metric, inflation, clusters-per-group) record.
///
/// The loaded fields are fixed at construction; only the group total and the
/// bucket are filled in by later pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRow {
    dataset: Dataset,
    metric: Metric,
    inflation: f64,
    cluster_count: u64,
    clusters_per_group: u32,
    group_total: Option<u64>,
    bucket: Option<Bucket>,
}

impl ClusterRow {
    pub fn new(
        dataset: Dataset,
        metric: Metric,
        inflation: f64,
        cluster_count: u64,
        clusters_per_group: u32,
    ) -> Self {
        Self {
            dataset,
            metric,
            inflation,
            cluster_count,
            clusters_per_group,
            group_total: None,
            bucket: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn inflation(&self) -> f64 {
        self.inflation
    }

    pub fn cluster_count(&self) -> u64 {
        self.cluster_count
    }

    pub fn clusters_per_group(&self) -> u32 {
        self.clusters_per_group
    }

    /// Sum of `ClusterCount` over every row sharing this row's (metric, inflation)
    pub fn group_total(&self) -> Option<u64> {
        self.group_total
    }

    pub fn bucket(&self) -> Option<Bucket> {
        self.bucket
    }

    pub(crate) fn set_group_total(&mut self, total: u64) {
        self.group_total = Some(total);
    }

    pub(crate) fn set_bucket(&mut self, bucket: Bucket) {
        self.bucket = Some(bucket);
    }
}

/// The unified, metric-validated table every later stage works on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterTable {
    pub rows: Vec<ClusterRow>,
}

impl ClusterTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest single `ClusterCount` in the table, or 0 when empty
    pub fn max_cluster_count(&self) -> u64 {
        self.rows
            .iter()
            .map(ClusterRow::cluster_count)
            .max()
            .unwrap_or(0)
    }

    /// Rows belonging to one dataset, in load order
    pub fn rows_for<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a ClusterRow> {
        self.rows.iter().filter(move |row| row.dataset() == dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("E-value", Metric::EValue)]
    #[case("evl", Metric::EValue)]
    #[case("BitScore", Metric::BitScore)]
    #[case("bit", Metric::BitScore)]
    #[case("BitScorePerResidue", Metric::BitScorePerResidue)]
    #[case("bpr", Metric::BitScorePerResidue)]
    #[case("BitScoreRatio", Metric::BitScoreRatio)]
    #[case("bsr", Metric::BitScoreRatio)]
    fn parses_metric_names_and_codes(#[case] input: &str, #[case] expected: Metric) {
        assert_eq!(input.parse::<Metric>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_metric() {
        assert_eq!(
            "bitscore".parse::<Metric>(),
            Err(UnknownMetric("bitscore".to_string()))
        );
    }

    #[test]
    fn metric_order_matches_display_order() {
        let mut shuffled = vec![
            Metric::BitScoreRatio,
            Metric::EValue,
            Metric::BitScorePerResidue,
            Metric::BitScore,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Metric::ALL.to_vec());
    }

    #[test]
    fn dataset_displays_with_prefix() {
        assert_eq!(Dataset::new("3").to_string(), "eck_3");
        assert_eq!(Dataset::new("3").id(), "3");
    }

    #[test]
    fn max_cluster_count_of_empty_table_is_zero() {
        assert_eq!(ClusterTable::default().max_cluster_count(), 0);
    }
}
