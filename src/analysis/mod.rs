//! Table-level analysis stages
//!
//! This module contains:
//! - Per-(metric, inflation) group totals
//! - Fixed inputs and chart geometry constants
//! - Text and JSON reports accompanying the chart

pub mod aggregate;
pub mod constants;
pub mod fragmentation;

// Re-export analysis functions for convenience
pub use aggregate::{attach_group_totals, group_totals, AggregateError, GroupTotal};
pub use fragmentation::{generate_fragmentation_summary, write_group_totals_json, ReportError};
