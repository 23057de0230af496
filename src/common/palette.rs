//! Legend colours for the clusters-per-group buckets
//!
//! Bucket `1` (a group recovered as a single cluster) gets the "good" colour.
//! Every other bucket gets a colour from the warm half of the reversed RdYlBu
//! diverging palette, ordered by increasing severity.

use crate::common::buckets::Bucket;
use plotters::style::RGBColor;
use thiserror::Error;

/// Errors that can occur while building a palette
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error("Palette needs at least one bucket")]
    Empty,

    #[error("Palette supports at most {max} buckets, requested {requested}")]
    TooManyBuckets { requested: usize, max: usize },
}

type Result<T> = core::result::Result<T, PaletteError>;

/// Colour of the bucket for groups that were not fragmented
pub const GOOD_COLOR: RGBColor = RGBColor(0x45, 0x75, 0xB4);

/// 11-class RdYlBu, reversed so it runs from cool to warm
const RD_YL_BU_REVERSED: [RGBColor; 11] = [
    RGBColor(0x31, 0x36, 0x95),
    RGBColor(0x45, 0x75, 0xB4),
    RGBColor(0x74, 0xAD, 0xD1),
    RGBColor(0xAB, 0xD9, 0xE9),
    RGBColor(0xE0, 0xF3, 0xF8),
    RGBColor(0xFF, 0xFF, 0xBF),
    RGBColor(0xFE, 0xE0, 0x90),
    RGBColor(0xFD, 0xAE, 0x61),
    RGBColor(0xF4, 0x6D, 0x43),
    RGBColor(0xD7, 0x30, 0x27),
    RGBColor(0xA5, 0x00, 0x26),
];

/// Index of the first colour past the neutral midpoint
const SEVERITY_START: usize = 6;

/// Colours available for fragmented buckets, least to most severe
fn severity_colors() -> &'static [RGBColor] {
    &RD_YL_BU_REVERSED[SEVERITY_START..]
}

/// Builds `k` colours: the good colour followed by `k - 1` severity colours
pub fn build_colors(k: usize) -> Result<Vec<RGBColor>> {
    if k == 0 {
        return Err(PaletteError::Empty);
    }

    let bad = severity_colors();
    if k - 1 > bad.len() {
        return Err(PaletteError::TooManyBuckets {
            requested: k,
            max: bad.len() + 1,
        });
    }

    let mut colors = Vec::with_capacity(k);
    colors.push(GOOD_COLOR);
    colors.extend_from_slice(&bad[..k - 1]);
    Ok(colors)
}

/// Colour assignment for the buckets present in a chart
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    entries: Vec<(Bucket, RGBColor)>,
}

impl Palette {
    /// Builds the palette for `buckets`, which must be in legend order.
    ///
    /// Bucket `1` always receives [`GOOD_COLOR`], even when it is the only bucket.
    pub fn for_buckets(buckets: &[Bucket]) -> Result<Self> {
        if buckets.is_empty() {
            return Err(PaletteError::Empty);
        }

        let has_good = buckets.first() == Some(&Bucket::One);
        // Reserve the good slot even when bucket 1 is absent so severities stay aligned.
        let colors = build_colors(if has_good {
            buckets.len()
        } else {
            buckets.len() + 1
        })?;
        let offset = usize::from(!has_good);

        let entries = buckets
            .iter()
            .zip(&colors[offset..])
            .map(|(bucket, color)| (*bucket, *color))
            .collect();

        Ok(Self { entries })
    }

    pub fn color_of(&self, bucket: Bucket) -> Option<RGBColor> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == bucket)
            .map(|(_, color)| *color)
    }

    /// Bucket/colour pairs in legend order
    pub fn entries(&self) -> &[(Bucket, RGBColor)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bucket_is_good_color_only() {
        assert_eq!(build_colors(1).unwrap(), vec![GOOD_COLOR]);
    }

    #[test]
    fn five_buckets_use_four_distinct_severity_colors() {
        let colors = build_colors(5).unwrap();
        assert_eq!(colors.len(), 5);
        assert_eq!(colors[0], GOOD_COLOR);

        for (i, color) in colors[1..].iter().enumerate() {
            assert!(RD_YL_BU_REVERSED.contains(color));
            assert_ne!(*color, GOOD_COLOR);
            assert!(!colors[1..i + 1].contains(color), "duplicate colour {color:?}");
        }
    }

    #[test]
    fn rejects_empty_and_oversized_requests() {
        assert_eq!(build_colors(0), Err(PaletteError::Empty));
        assert_eq!(
            build_colors(7),
            Err(PaletteError::TooManyBuckets {
                requested: 7,
                max: 6
            })
        );
    }

    #[test]
    fn palette_assigns_good_color_to_bucket_one() {
        let palette = Palette::for_buckets(&Bucket::ALL).unwrap();
        assert_eq!(palette.entries().len(), 5);
        assert_eq!(palette.color_of(Bucket::One), Some(GOOD_COLOR));
        assert_eq!(palette.color_of(Bucket::FivePlus), Some(severity_colors()[3]));
    }

    #[test]
    fn palette_needs_buckets() {
        assert_eq!(Palette::for_buckets(&[]), Err(PaletteError::Empty));
    }

    #[test]
    fn palette_without_bucket_one_never_uses_good_color() {
        let palette = Palette::for_buckets(&[Bucket::Two, Bucket::FivePlus]).unwrap();
        assert_eq!(palette.color_of(Bucket::One), None);
        assert_eq!(palette.color_of(Bucket::Two), Some(severity_colors()[0]));
        assert_eq!(palette.color_of(Bucket::FivePlus), Some(severity_colors()[1]));
    }
}
