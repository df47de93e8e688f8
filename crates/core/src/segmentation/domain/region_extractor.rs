use std::ops::Range;

use thiserror::Error;

use crate::shared::constants::{DEFAULT_REGION_BOTTOM, DEFAULT_REGION_TOP};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BandError {
    #[error("band fractions must lie within 0.0-1.0, got top={top}, bottom={bottom}")]
    OutOfRange { top: f64, bottom: f64 },
    #[error("band top {top} must lie above bottom {bottom}")]
    Inverted { top: f64, bottom: f64 },
    #[error("band rows {top}..{bottom} are empty for frame height {height}")]
    Empty { top: u32, bottom: u32, height: u32 },
}

/// Crops frames to the horizontal strip where subtitles are burned in.
///
/// The strip is given as fractions of the frame height and resolved to
/// rows per frame: `floor(height * top)..floor(height * bottom)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionExtractor {
    top: f64,
    bottom: f64,
}

impl RegionExtractor {
    pub fn new(top: f64, bottom: f64) -> Result<Self, BandError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(top) || !in_unit(bottom) {
            return Err(BandError::OutOfRange { top, bottom });
        }
        if top >= bottom {
            return Err(BandError::Inverted { top, bottom });
        }
        Ok(Self { top, bottom })
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    /// Resolves the band to a row range for a frame of the given height.
    /// A thin band can still floor to zero rows on a short frame.
    pub fn rows(&self, height: u32) -> Result<Range<u32>, BandError> {
        let top = (height as f64 * self.top).floor() as u32;
        let bottom = (height as f64 * self.bottom).floor() as u32;
        if top >= bottom {
            return Err(BandError::Empty {
                top,
                bottom,
                height,
            });
        }
        Ok(top..bottom)
    }

    pub fn extract(&self, frame: &Frame) -> Result<Region, BandError> {
        let rows = self.rows(frame.height())?;
        let top = rows.start;
        let band_height = rows.end - rows.start;
        let data = frame
            .rows(rows)
            .expect("band rows lie within frame height")
            .to_vec();

        Ok(Region::new(
            data,
            frame.width(),
            band_height,
            frame.channels(),
            frame.index(),
            top,
        ))
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self {
            top: DEFAULT_REGION_TOP,
            bottom: DEFAULT_REGION_BOTTOM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row_numbered_frame(width: u32, height: u32) -> Frame {
        let data = (0..height)
            .flat_map(|r| std::iter::repeat(r as u8).take((width * 3) as usize))
            .collect();
        Frame::new(data, width, height, 3, 17)
    }

    #[test]
    fn test_rows_floor_fractions() {
        let extractor = RegionExtractor::new(0.86, 0.94).unwrap();
        // 720 * 0.86 = 619.2, 720 * 0.94 = 676.8
        assert_eq!(extractor.rows(720).unwrap(), 619..676);
    }

    #[test]
    fn test_extract_keeps_band_rows_only() {
        let extractor = RegionExtractor::new(0.5, 0.75).unwrap();
        let region = extractor.extract(&row_numbered_frame(4, 8)).unwrap();

        assert_eq!(region.height(), 2);
        assert_eq!(region.width(), 4);
        assert_eq!(region.top_row(), 4);
        assert_eq!(region.source_index(), 17);
        let arr = region.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 4);
        assert_eq!(arr[[1, 3, 2]], 5);
    }

    #[test]
    fn test_full_height_band() {
        let extractor = RegionExtractor::new(0.0, 1.0).unwrap();
        let frame = row_numbered_frame(3, 5);
        let region = extractor.extract(&frame).unwrap();
        assert_eq!(region.data(), frame.data());
    }

    #[rstest]
    #[case::negative_top(-0.1, 0.5)]
    #[case::bottom_above_one(0.2, 1.5)]
    #[case::nan(f64::NAN, 0.5)]
    fn test_fractions_out_of_range(#[case] top: f64, #[case] bottom: f64) {
        assert!(matches!(
            RegionExtractor::new(top, bottom),
            Err(BandError::OutOfRange { .. })
        ));
    }

    #[rstest]
    #[case::inverted(0.9, 0.8)]
    #[case::equal(0.5, 0.5)]
    #[case::both_zero(0.0, 0.0)]
    fn test_inverted_fractions(#[case] top: f64, #[case] bottom: f64) {
        assert_eq!(
            RegionExtractor::new(top, bottom),
            Err(BandError::Inverted { top, bottom })
        );
    }

    #[rstest]
    #[case::rounds_to_same_row(0.50, 0.51, 10)]
    #[case::single_row_frame(0.86, 0.94, 1)]
    fn test_empty_band(#[case] top: f64, #[case] bottom: f64, #[case] height: u32) {
        let extractor = RegionExtractor::new(top, bottom).unwrap();
        assert!(matches!(
            extractor.rows(height),
            Err(BandError::Empty { .. })
        ));
    }

    #[test]
    fn test_default_band() {
        let extractor = RegionExtractor::default();
        assert_eq!(extractor.top(), DEFAULT_REGION_TOP);
        assert_eq!(extractor.bottom(), DEFAULT_REGION_BOTTOM);
    }
}
