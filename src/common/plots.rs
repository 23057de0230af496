//! Plotting infrastructure for the faceted fragmentation chart
//!
//! This module builds the stacked bar chart with the [`plotters`] crate and
//! converts it to PDF. The chart is a grid of facets, one row per dataset and
//! one column per metric. Each facet shows inflation on the X axis and the
//! number of clusters on the Y axis, with bars stacked by clusters-per-KOG
//! bucket.
//!
//! Rendering happens in two steps:
//! - [`FacetGrid::build`] bins and stacks the table (no drawing, easy to inspect)
//! - [`render_pdf`] draws the grid to an in-memory SVG and converts it with [`svg2pdf`]

use crate::analysis::constants::{MIN_FACET_SHARE, PAGE_SIZE_PT, REFERENCE_LINE_STEP};
use crate::common::buckets::Bucket;
use crate::common::data_structures::{ClusterTable, Dataset, Metric};
use crate::common::palette::Palette;
use log::{debug, info, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use svg2pdf::usvg;
use thiserror::Error;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to convert chart to PDF: {0}")]
    PdfConversion(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

const FONT_FAMILY: &str = "sans-serif";
const STRIP_SIZE: i32 = 16;
const LEGEND_HEIGHT: i32 = 34;
const STRIP_FILL: RGBColor = RGBColor(0xD9, 0xD9, 0xD9);
const LEGEND_SWATCH: i32 = 10;
/// Headroom above the tallest bar of a row
const Y_HEADROOM: f64 = 1.05;
/// Tolerance, in bin widths, for values sitting on a bin edge
const BIN_EDGE_FUZZ: f64 = 1e-7;

/// One bucket's share of a stacked bar
#[derive(Debug, Clone, PartialEq)]
pub struct StackSegment {
    pub bucket: Bucket,
    pub clusters: u64,
}

/// A single inflation bin of a facet
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Centre of the bin; always a multiple of the bin width
    pub center: f64,
    pub width: f64,
    /// Segments bottom to top, in legend order
    pub segments: Vec<StackSegment>,
}

impl Bar {
    pub fn start(&self) -> f64 {
        self.center - self.width / 2.0
    }

    pub fn end(&self) -> f64 {
        self.center + self.width / 2.0
    }

    /// Total clusters in the bin
    pub fn height(&self) -> u64 {
        self.segments.iter().map(|segment| segment.clusters).sum()
    }
}

/// Bars of one (dataset, metric) cell of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub dataset: Dataset,
    pub metric: Metric,
    /// Bars ordered by inflation
    pub bars: Vec<Bar>,
}

impl Facet {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn max_height(&self) -> u64 {
        self.bars.iter().map(Bar::height).max().unwrap_or(0)
    }
}

/// Binned, stacked chart data laid out as datasets (rows) by metrics (columns)
#[derive(Debug, Clone, PartialEq)]
pub struct FacetGrid {
    datasets: Vec<Dataset>,
    bin_width: f64,
    /// Row-major, `datasets.len() * Metric::ALL.len()` entries
    facets: Vec<Facet>,
    reference_lines: Vec<u64>,
}

/// Index of the bin holding `inflation`.
///
/// Bin `k` covers `[(k - 0.5) * bin_width, (k + 0.5) * bin_width)`: closed on
/// the lower edge, open on the upper one. Values within `1e-7` bin
/// widths below an edge are snapped onto it, so `2.05 / 0.1` evaluating to
/// `20.4999...` still opens the `2.1` bin.
pub fn bin_index(inflation: f64, bin_width: f64) -> i64 {
    (inflation / bin_width + 0.5 + BIN_EDGE_FUZZ).floor() as i64
}

/// Horizontal reference line positions: every `step` clusters up to `max_clusters`
pub fn reference_lines(max_clusters: u64, step: u64) -> Vec<u64> {
    if step == 0 {
        return Vec::new();
    }
    (1..=max_clusters / step).map(|i| i * step).collect()
}

/// Splits `total_px` into segments proportional to `weights`.
///
/// Each segment gets at least [`MIN_FACET_SHARE`] of the total before
/// renormalising. Returns the `weights.len() - 1` inner breakpoints.
pub fn proportional_breaks(weights: &[f64], total_px: i32) -> Vec<i32> {
    let sum: f64 = weights.iter().sum();
    let shares: Vec<f64> = if sum > 0.0 {
        weights
            .iter()
            .map(|weight| (weight / sum).max(MIN_FACET_SHARE))
            .collect()
    } else {
        vec![1.0; weights.len()]
    };
    let share_sum: f64 = shares.iter().sum();

    let mut breaks = Vec::with_capacity(weights.len().saturating_sub(1));
    let mut acc = 0.0;
    for share in shares.iter().take(weights.len().saturating_sub(1)) {
        acc += share / share_sum;
        breaks.push((acc * total_px as f64).round() as i32);
    }
    breaks
}

impl FacetGrid {
    /// Bins `table` by inflation and stacks each bin by bucket.
    ///
    /// # Arguments
    /// * `table` - Bucketized rows; every row must belong to one of `datasets`
    /// * `datasets` - Grid rows, top to bottom
    /// * `bin_width` - Width of an inflation bin, see [`bin_index`]
    ///
    /// # Returns
    /// The grid, or [`PlotError::InvalidData`] for a non-positive bin width, an
    /// unbucketized or foreign row, or a bin whose cluster total overflows `u64`
    pub fn build(table: &ClusterTable, datasets: &[Dataset], bin_width: f64) -> Result<Self> {
        if !(bin_width.is_finite() && bin_width > 0.0) {
            return Err(PlotError::InvalidData(format!(
                "Bin width must be positive, got {bin_width}"
            )));
        }

        let columns = Metric::ALL.len();
        let mut cells: Vec<BTreeMap<i64, BTreeMap<Bucket, u64>>> =
            vec![BTreeMap::new(); datasets.len() * columns];

        for row in &table.rows {
            let dataset_index = datasets
                .iter()
                .position(|dataset| dataset == row.dataset())
                .ok_or_else(|| {
                    PlotError::InvalidData(format!("Row from unexpected dataset {}", row.dataset()))
                })?;
            let bucket = row.bucket().ok_or_else(|| {
                PlotError::InvalidData("Rows must be bucketized before plotting".to_string())
            })?;
            let metric_index = row.metric() as usize;
            let bin = bin_index(row.inflation(), bin_width);

            let stack = cells[dataset_index * columns + metric_index]
                .entry(bin)
                .or_default();
            let clusters = stack.entry(bucket).or_default();
            *clusters = clusters
                .checked_add(row.cluster_count())
                .ok_or_else(|| overflow_error(row.dataset(), row.metric(), bin, bin_width))?;
        }

        let mut facets = Vec::with_capacity(cells.len());
        for (index, bins) in cells.into_iter().enumerate() {
            let dataset = &datasets[index / columns];
            let metric = Metric::ALL[index % columns];

            let mut bars = Vec::with_capacity(bins.len());
            for (bin, stack) in bins {
                // Bar heights are summed again while drawing; they must fit too.
                stack
                    .values()
                    .try_fold(0u64, |total, clusters| total.checked_add(*clusters))
                    .ok_or_else(|| overflow_error(dataset, metric, bin, bin_width))?;

                bars.push(Bar {
                    center: bin as f64 * bin_width,
                    width: bin_width,
                    segments: stack
                        .into_iter()
                        .map(|(bucket, clusters)| StackSegment { bucket, clusters })
                        .collect(),
                });
            }

            facets.push(Facet {
                dataset: dataset.clone(),
                metric,
                bars,
            });
        }

        let grid = Self {
            datasets: datasets.to_vec(),
            bin_width,
            facets,
            reference_lines: reference_lines(table.max_cluster_count(), REFERENCE_LINE_STEP),
        };

        for (column, metric) in Metric::ALL.iter().enumerate() {
            if grid.column_x_range(column).is_none() {
                warn!("No rows for metric {metric}; its column will be empty");
            }
        }
        debug!(
            "Built {}x{} facet grid with {} reference lines",
            grid.datasets.len(),
            columns,
            grid.reference_lines.len()
        );
        Ok(grid)
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn reference_lines(&self) -> &[u64] {
        &self.reference_lines
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn facet(&self, dataset: &Dataset, metric: Metric) -> Option<&Facet> {
        let row = self.datasets.iter().position(|d| d == dataset)?;
        self.facets.get(row * Metric::ALL.len() + metric as usize)
    }

    /// X range shared by a metric column, padded by half a bin; `None` when the column is empty
    pub fn column_x_range(&self, column: usize) -> Option<(f64, f64)> {
        let bars = self
            .facets
            .iter()
            .skip(column)
            .step_by(Metric::ALL.len())
            .flat_map(|facet| facet.bars.iter());

        let (lo, hi) = bars.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), bar| {
            (lo.min(bar.start()), hi.max(bar.end()))
        });
        (lo <= hi).then(|| (lo - self.bin_width / 2.0, hi + self.bin_width / 2.0))
    }

    /// Tallest bar in a dataset row
    pub fn row_y_max(&self, row: usize) -> u64 {
        let columns = Metric::ALL.len();
        self.facets[row * columns..(row + 1) * columns]
            .iter()
            .map(Facet::max_height)
            .max()
            .unwrap_or(0)
    }

    /// Upper end of the y axis shared by a dataset row
    pub fn row_y_limit(&self, row: usize) -> f64 {
        self.row_y_max(row).max(1) as f64 * Y_HEADROOM
    }

    /// Reference lines that fit inside a dataset row's y axis
    pub fn row_reference_lines(&self, row: usize) -> Vec<u64> {
        let limit = self.row_y_limit(row);
        self.reference_lines
            .iter()
            .copied()
            .filter(|&line| line as f64 <= limit)
            .collect()
    }
}

fn overflow_error(dataset: &Dataset, metric: Metric, bin: i64, bin_width: f64) -> PlotError {
    PlotError::InvalidData(format!(
        "Cluster total of {dataset} {metric} bin {:.3} does not fit in 64 bits",
        bin as f64 * bin_width
    ))
}

/// Renders the grid and writes it as a single-page PDF to `output_path`
///
/// # Arguments
/// * `grid` - Binned chart data from [`FacetGrid::build`]
/// * `palette` - Colours for every bucket appearing in `grid`
/// * `output_path` - Path to save the PDF file to
///
/// # Returns
/// `Ok(())` once the page (8.5 x 9 in) has been written in a single
/// `fs::write`, or the first drawing, conversion or I/O error
pub fn render_pdf(grid: &FacetGrid, palette: &Palette, output_path: &Path) -> Result<()> {
    if grid.datasets().is_empty() {
        return Err(PlotError::InvalidData("Grid has no datasets".to_string()));
    }

    let svg = render_svg(grid, palette, PAGE_SIZE_PT)?;
    let pdf = svg_to_pdf(&svg)?;
    fs::write(output_path, pdf)?;

    info!("Wrote chart to {}", output_path.display());
    Ok(())
}

/// Draws the grid into an SVG document of `size` pixels
pub fn render_svg(grid: &FacetGrid, palette: &Palette, size: (u32, u32)) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

        draw_chart(&root, grid, palette)?;

        root.present()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }
    Ok(svg)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    grid: &FacetGrid,
    palette: &Palette,
) -> Result<()> {
    let (width, height) = root.dim_in_pixel();
    let (width, height) = (width as i32, height as i32);
    let columns = Metric::ALL.len();

    let (main, legend) = root.split_vertically(height - LEGEND_HEIGHT);
    let (header, body) = main.split_vertically(STRIP_SIZE);
    let (header, _) = header.split_horizontally(width - STRIP_SIZE);
    let (facet_area, row_strip) = body.split_horizontally(width - STRIP_SIZE);
    let (facet_width, facet_height) = facet_area.dim_in_pixel();

    // Free space: columns sized by x span, rows by tallest bar
    let column_spans: Vec<f64> = (0..columns)
        .map(|column| {
            grid.column_x_range(column)
                .map_or(0.0, |(lo, hi)| hi - lo)
        })
        .collect();
    let row_heights: Vec<f64> = (0..grid.datasets().len())
        .map(|row| grid.row_y_max(row) as f64)
        .collect();
    let x_breaks = proportional_breaks(&column_spans, facet_width as i32);
    let y_breaks = proportional_breaks(&row_heights, facet_height as i32);

    let panels = facet_area.split_by_breakpoints(x_breaks.as_slice(), y_breaks.as_slice());
    for (index, (panel, facet)) in panels.iter().zip(grid.facets()).enumerate() {
        draw_facet(
            panel,
            facet,
            grid.column_x_range(index % columns),
            grid.row_y_limit(index / columns),
            &grid.row_reference_lines(index / columns),
            palette,
        )?;
    }

    let no_breaks: &[i32] = &[];
    let column_strips = header.split_by_breakpoints(x_breaks.as_slice(), no_breaks);
    for (strip, metric) in column_strips.iter().zip(Metric::ALL) {
        draw_strip(strip, metric.name(), false)?;
    }

    let row_strips = row_strip.split_by_breakpoints(no_breaks, y_breaks.as_slice());
    for (strip, dataset) in row_strips.iter().zip(grid.datasets()) {
        draw_strip(strip, &dataset.to_string(), true)?;
    }

    draw_legend(&legend, palette)
}

fn draw_facet<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    facet: &Facet,
    x_range: Option<(f64, f64)>,
    y_hi: f64,
    reference_lines: &[u64],
    palette: &Palette,
) -> Result<()> {
    let (x_lo, x_hi) = x_range.unwrap_or((0.0, 1.0));

    let mut chart = ChartBuilder::on(area)
        .margin(3)
        .x_label_area_size(14)
        .y_label_area_size(26)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(3)
        .y_labels(3)
        .label_style((FONT_FAMILY, 7))
        .x_label_formatter(&|x| format!("{x:.1}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut rectangles = Vec::new();
    for bar in &facet.bars {
        let mut base = 0u64;
        for segment in &bar.segments {
            let color = palette.color_of(segment.bucket).ok_or_else(|| {
                PlotError::InvalidData(format!("No colour for bucket {}", segment.bucket))
            })?;
            let top = base + segment.clusters;
            rectangles.push(Rectangle::new(
                [(bar.start(), base as f64), (bar.end(), top as f64)],
                color.filled(),
            ));
            base = top;
        }
    }
    chart
        .draw_series(rectangles)
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let lines = reference_lines
        .iter()
        .map(|&line| line as f64)
        .map(|line| PathElement::new(vec![(x_lo, line), (x_hi, line)], BLACK.mix(0.25)));
    chart
        .draw_series(lines)
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    Ok(())
}

fn draw_strip<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    label: &str,
    vertical: bool,
) -> Result<()> {
    area.fill(&STRIP_FILL)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let (width, height) = area.dim_in_pixel();
    let mut style =
        TextStyle::from((FONT_FAMILY, 8).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    if vertical {
        style = style.transform(FontTransform::Rotate90);
    }

    area.draw(&Text::new(
        label.to_string(),
        (width as i32 / 2, height as i32 / 2),
        style,
    ))
    .map_err(|e| PlotError::Drawing(e.to_string()))
}

fn draw_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, palette: &Palette) -> Result<()> {
    let (_, height) = area.dim_in_pixel();
    let middle = height as i32 / 2;
    let label_style =
        TextStyle::from((FONT_FAMILY, 8).into_font()).pos(Pos::new(HPos::Left, VPos::Center));

    area.draw(&Text::new(
        "Clusters per KOG".to_string(),
        (40, middle),
        label_style.clone(),
    ))
    .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut x = 130;
    for (bucket, color) in palette.entries() {
        area.draw(&Rectangle::new(
            [
                (x, middle - LEGEND_SWATCH / 2),
                (x + LEGEND_SWATCH, middle + LEGEND_SWATCH / 2),
            ],
            color.filled(),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
        area.draw(&Text::new(
            bucket.label().to_string(),
            (x + LEGEND_SWATCH + 4, middle),
            label_style.clone(),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
        x += 40;
    }

    Ok(())
}

/// Converts an SVG document into PDF bytes, one page sized like the SVG
fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| PlotError::PdfConversion(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| PlotError::PdfConversion(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::buckets::bucketize;
    use crate::common::data_structures::ClusterRow;
    use crate::common::palette::GOOD_COLOR;
    use rstest::rstest;

    fn datasets() -> Vec<Dataset> {
        ["1", "2"].into_iter().map(Dataset::new).collect()
    }

    fn table(rows: &[(&str, Metric, f64, u64, u32)]) -> ClusterTable {
        let mut table = ClusterTable {
            rows: rows
                .iter()
                .map(|&(dataset, metric, inflation, count, per_group)| {
                    ClusterRow::new(Dataset::new(dataset), metric, inflation, count, per_group)
                })
                .collect(),
        };
        bucketize(&mut table).unwrap();
        table
    }

    #[test]
    fn test_reference_lines() {
        assert_eq!(reference_lines(99, 100), Vec::<u64>::new());
        assert_eq!(reference_lines(100, 100), vec![100]);
        assert_eq!(reference_lines(350, 100), vec![100, 200, 300]);
        assert_eq!(reference_lines(350, 0), Vec::<u64>::new());
    }

    #[rstest]
    #[case(2.0, 20)]
    #[case(1.95, 20)]
    #[case(2.05, 21)]
    #[case(1.35, 14)]
    #[case(1.9499, 19)]
    #[case(2.0499, 20)]
    #[case(0.0, 0)]
    fn bins_are_closed_on_the_lower_edge(#[case] inflation: f64, #[case] expected: i64) {
        assert_eq!(bin_index(inflation, 0.1), expected);
    }

    #[test]
    fn upper_edge_value_opens_the_next_bar() {
        let table = table(&[
            ("1", Metric::BitScore, 1.95, 1, 1),
            ("1", Metric::BitScore, 2.05, 2, 1),
        ]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        let facet = grid.facet(&Dataset::new("1"), Metric::BitScore).unwrap();

        let bars: Vec<(f64, u64)> = facet
            .bars
            .iter()
            .map(|bar| (bar.center, bar.height()))
            .collect();
        assert_eq!(bars.len(), 2);
        assert!((bars[0].0 - 2.0).abs() < 1e-9);
        assert_eq!(bars[0].1, 1);
        assert!((bars[1].0 - 2.1).abs() < 1e-9);
        assert_eq!(bars[1].1, 2);
    }

    #[test]
    fn overflowing_bin_total_is_rejected() {
        let same_bucket = table(&[
            ("1", Metric::BitScore, 2.0, u64::MAX, 1),
            ("1", Metric::BitScore, 2.0, 1, 1),
        ]);
        assert!(matches!(
            FacetGrid::build(&same_bucket, &datasets(), 0.1),
            Err(PlotError::InvalidData(_))
        ));

        // Different buckets in one bin must fit as a stacked bar too
        let stacked = table(&[
            ("1", Metric::BitScore, 2.0, u64::MAX, 1),
            ("1", Metric::BitScore, 2.0, 1, 2),
        ]);
        assert!(matches!(
            FacetGrid::build(&stacked, &datasets(), 0.1),
            Err(PlotError::InvalidData(_))
        ));
    }

    #[test]
    fn test_proportional_breaks() {
        assert_eq!(proportional_breaks(&[1.0, 1.0], 100), vec![50]);
        assert_eq!(proportional_breaks(&[3.0, 1.0], 100), vec![75]);
        assert_eq!(proportional_breaks(&[0.0, 0.0, 0.0, 0.0], 400), vec![100, 200, 300]);
        assert!(proportional_breaks(&[5.0], 100).is_empty());

        // Empty columns keep a minimum share
        let breaks = proportional_breaks(&[0.0, 1.0], 100);
        assert!(breaks[0] > 0);
    }

    #[test]
    fn stacks_segments_in_bucket_order_within_a_bin() {
        let table = table(&[
            ("1", Metric::BitScore, 2.02, 4, 6),
            ("1", Metric::BitScore, 1.98, 10, 1),
            ("1", Metric::BitScore, 2.0, 3, 2),
        ]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        let facet = grid.facet(&Dataset::new("1"), Metric::BitScore).unwrap();

        assert_eq!(facet.bars.len(), 1);
        let bar = &facet.bars[0];
        assert!((bar.center - 2.0).abs() < 1e-9);
        assert_eq!(bar.height(), 17);
        assert_eq!(
            bar.segments,
            vec![
                StackSegment { bucket: Bucket::One, clusters: 10 },
                StackSegment { bucket: Bucket::Two, clusters: 3 },
                StackSegment { bucket: Bucket::FivePlus, clusters: 4 },
            ]
        );
    }

    #[test]
    fn scales_are_free_per_column_and_row() {
        let table = table(&[
            ("1", Metric::EValue, 1.2, 50, 1),
            ("2", Metric::EValue, 4.0, 7, 1),
            ("2", Metric::BitScoreRatio, 2.0, 300, 3),
        ]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();

        let (lo, hi) = grid.column_x_range(Metric::EValue as usize).unwrap();
        assert!((lo - 1.1).abs() < 1e-9);
        assert!((hi - 4.1).abs() < 1e-9);
        assert_eq!(grid.column_x_range(Metric::BitScore as usize), None);

        assert_eq!(grid.row_y_max(0), 50);
        assert_eq!(grid.row_y_max(1), 300);
        assert_eq!(grid.reference_lines(), &[100, 200, 300]);
    }

    #[test]
    fn rejects_unbucketized_rows_and_unknown_datasets() {
        let raw = ClusterTable {
            rows: vec![ClusterRow::new(Dataset::new("1"), Metric::BitScore, 2.0, 1, 1)],
        };
        assert!(matches!(
            FacetGrid::build(&raw, &datasets(), 0.1),
            Err(PlotError::InvalidData(_))
        ));

        let stray = table(&[("9", Metric::BitScore, 2.0, 1, 1)]);
        assert!(matches!(
            FacetGrid::build(&stray, &datasets(), 0.1),
            Err(PlotError::InvalidData(_))
        ));

        assert!(matches!(
            FacetGrid::build(&stray, &datasets(), 0.0),
            Err(PlotError::InvalidData(_))
        ));
    }

    #[test]
    fn svg_contains_strips_and_bar_colour() {
        let table = table(&[("1", Metric::BitScore, 2.0, 10, 1)]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        let palette = Palette::for_buckets(&[Bucket::One]).unwrap();

        let svg = render_svg(&grid, &palette, PAGE_SIZE_PT).unwrap();
        assert!(svg.contains("BitScoreRatio"));
        assert!(svg.contains("eck_2"));
        assert!(svg.contains("Clusters per KOG"));

        let RGBColor(r, g, b) = GOOD_COLOR;
        assert!(svg.to_uppercase().contains(&format!("#{r:02X}{g:02X}{b:02X}")));
    }

    #[test]
    fn svg_page_is_612_by_648() {
        let table = table(&[("1", Metric::BitScore, 2.0, 10, 1)]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        let palette = Palette::for_buckets(&[Bucket::One]).unwrap();

        let svg = render_svg(&grid, &palette, PAGE_SIZE_PT).unwrap();
        assert!(svg.contains(r#"<svg width="612" height="648""#));
    }

    #[test]
    fn reference_lines_only_in_rows_they_fit() {
        let table = table(&[
            ("1", Metric::BitScore, 2.0, 250, 1),
            ("2", Metric::EValue, 1.4, 50, 1),
        ]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        assert_eq!(grid.reference_lines(), &[100, 200]);
        assert_eq!(grid.row_reference_lines(0), vec![100, 200]);
        assert!(grid.row_y_limit(1) < 100.0);
        assert!(grid.row_reference_lines(1).is_empty());

        // Two lines in each of the four facets of the first row, none below
        let palette = Palette::for_buckets(&[Bucket::One]).unwrap();
        let svg = render_svg(&grid, &palette, PAGE_SIZE_PT).unwrap();
        assert_eq!(svg.matches(r#"opacity="0.25""#).count(), 2 * Metric::ALL.len());
    }

    /// Numbers of every `/MediaBox [..]` array in a PDF
    fn media_boxes(pdf: &[u8]) -> Vec<Vec<f64>> {
        let text = String::from_utf8_lossy(pdf);
        text.match_indices("/MediaBox [")
            .map(|(start, marker)| {
                let rest = &text[start + marker.len()..];
                let end = rest.find(']').unwrap();
                rest[..end]
                    .split_whitespace()
                    .map(|value| value.parse().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn pdf_is_a_single_612_by_648_page() {
        let dir = tempfile::TempDir::new().unwrap();
        let table = table(&[("1", Metric::BitScore, 2.0, 10, 1)]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        let palette = Palette::for_buckets(&[Bucket::One]).unwrap();

        let path = dir.path().join("chart.pdf");
        render_pdf(&grid, &palette, &path).unwrap();
        let pdf = fs::read(path).unwrap();

        let text = String::from_utf8_lossy(&pdf);
        let pages = text.matches("/Type /Page").count() - text.matches("/Type /Pages").count();
        assert_eq!(pages, 1);

        let boxes = media_boxes(&pdf);
        assert!(!boxes.is_empty());
        for media_box in boxes {
            assert_eq!(media_box, vec![0.0, 0.0, 612.0, 648.0]);
        }
    }

    #[test]
    fn pdf_render_is_deterministic() {
        let dir = tempfile::TempDir::new().unwrap();
        let table = table(&[
            ("1", Metric::BitScore, 2.0, 120, 1),
            ("2", Metric::EValue, 1.4, 30, 5),
        ]);
        let grid = FacetGrid::build(&table, &datasets(), 0.1).unwrap();
        let palette = Palette::for_buckets(&[Bucket::One, Bucket::FivePlus]).unwrap();

        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        render_pdf(&grid, &palette, &first).unwrap();
        render_pdf(&grid, &palette, &second).unwrap();

        let first = fs::read(first).unwrap();
        assert!(first.starts_with(b"%PDF"));
        assert_eq!(first, fs::read(second).unwrap());
    }
}
