//! Fixed inputs and chart geometry
//!
//! The defaults reproduce the original fixed run; every input value can be
//! overridden from the command line.

/// Directory the `eck_<id>` dataset folders live in
pub const DEFAULT_BASE_DIR: &str = ".";

/// Synthetic benchmark datasets, in chart row order
pub const DEFAULT_DATASET_IDS: [&str; 5] = ["1", "2", "3", "4", "5"];

/// Name of the rendered chart
pub const DEFAULT_OUTPUT_FILE: &str = "eckFragmentationShuffledRandomSensitivity.pdf";

/// Width of an inflation bin on the x axis
pub const DEFAULT_BIN_WIDTH: f64 = 0.1;

/// Spacing of the horizontal reference lines, in clusters
pub const REFERENCE_LINE_STEP: u64 = 100;

/// PDF points per inch; the SVG is rendered at one pixel per point
pub const POINTS_PER_INCH: f64 = 72.0;

/// Page width in inches
pub const PAGE_WIDTH_IN: f64 = 8.5;

/// Page height in inches
pub const PAGE_HEIGHT_IN: f64 = 9.0;

/// Page size in points (612 x 648)
pub const PAGE_SIZE_PT: (u32, u32) = (
    (PAGE_WIDTH_IN * POINTS_PER_INCH) as u32,
    (PAGE_HEIGHT_IN * POINTS_PER_INCH) as u32,
);

/// Smallest share of the facet area a row or column may get
pub const MIN_FACET_SHARE: f64 = 0.08;
