//! Common infrastructure shared across pipeline stages
//!
//! This module provides reusable infrastructure for:
//! - Data structures for the cluster summary tables
//! - Clusters-per-group buckets and ASCII table formatting
//! - Legend palette construction
//! - Plotting the faceted fragmentation chart

pub mod buckets;
pub mod data_structures;
pub mod palette;
pub mod plots;

// Re-export commonly used items
pub use buckets::{Bucket, BucketError};
pub use data_structures::{ClusterRow, ClusterTable, Dataset, Metric};
pub use palette::{Palette, PaletteError};
pub use plots::{FacetGrid, PlotError};
