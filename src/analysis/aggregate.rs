//! Per-(metric, inflation) cluster totals
//!
//! Totals are broadcast back onto every row of their group rather than
//! reducing the table to one row per group.

use crate::common::data_structures::{ClusterTable, Metric};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while summing groups
#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("Cluster total of {metric} at inflation {inflation} does not fit in 64 bits")]
    Overflow { metric: Metric, inflation: f64 },
}

type Result<T> = core::result::Result<T, AggregateError>;

/// Grouping key for inflation values.
///
/// `-0.0` is folded into `0.0` so the two land in the same group.
fn inflation_key(inflation: f64) -> u64 {
    (inflation + 0.0).to_bits()
}

/// Total clusters of one (metric, inflation) group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub metric: Metric,
    pub inflation: f64,
    pub total_clusters: u64,
    /// Number of table rows in the group
    pub rows: usize,
}

/// Sums `ClusterCount` per (metric, inflation), ordered by metric then inflation
pub fn group_totals(table: &ClusterTable) -> Result<Vec<GroupTotal>> {
    let mut groups: BTreeMap<(Metric, u64), GroupTotal> = BTreeMap::new();
    for row in &table.rows {
        let group = groups
            .entry((row.metric(), inflation_key(row.inflation())))
            .or_insert_with(|| GroupTotal {
                metric: row.metric(),
                inflation: row.inflation(),
                total_clusters: 0,
                rows: 0,
            });
        group.total_clusters = group
            .total_clusters
            .checked_add(row.cluster_count())
            .ok_or(AggregateError::Overflow {
                metric: row.metric(),
                inflation: row.inflation(),
            })?;
        group.rows += 1;
    }

    let mut totals: Vec<GroupTotal> = groups.into_values().collect();
    // Bit patterns do not order negative floats, so sort on the value itself.
    totals.sort_by(|a, b| {
        a.metric
            .cmp(&b.metric)
            .then(a.inflation.total_cmp(&b.inflation))
    });
    Ok(totals)
}

/// Writes each row's group total into the row.
///
/// This is a broadcast, not a reduction: rows keep their count and order, and
/// every row of a group receives the same total.
///
/// # Arguments
/// * `table` - Table whose rows receive their `(Metric, Inflation)` total
///
/// # Returns
/// `Ok(())`, or [`AggregateError::Overflow`] when a group's sum exceeds `u64`,
/// in which case no row is modified
pub fn attach_group_totals(table: &mut ClusterTable) -> Result<()> {
    let totals: BTreeMap<(Metric, u64), u64> = group_totals(table)?
        .into_iter()
        .map(|group| {
            (
                (group.metric, inflation_key(group.inflation)),
                group.total_clusters,
            )
        })
        .collect();
    debug!("Computed totals for {} (metric, inflation) groups", totals.len());

    for row in &mut table.rows {
        if let Some(total) = totals.get(&(row.metric(), inflation_key(row.inflation()))) {
            row.set_group_total(*total);
        }
    }
    Ok(())
}
