use thiserror::Error;

use super::cue::Cue;
use super::dissimilarity::mean_squared_error;
use crate::shared::constants::DEFAULT_SIMILARITY_THRESHOLD;
use crate::shared::region::Region;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("similarity threshold must be a positive number, got {0}")]
    InvalidThreshold(f64),
}

/// Groups consecutive subtitle bands into cues.
///
/// Each band is compared with the band immediately before it (not with the
/// cue's first band). A score strictly below the threshold extends the open
/// cue; anything else closes it and opens a new one. Bands of different
/// shapes always start a new cue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilaritySegmenter {
    threshold: f64,
}

impl SimilaritySegmenter {
    pub fn new(threshold: f64) -> Result<Self, SegmentError> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(SegmentError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Folds the band sequence into cues ordered by `start`.
    ///
    /// The input is consumed lazily; only the previous band and the open
    /// cue's representative are held while folding.
    pub fn segment<I>(&self, regions: I) -> Vec<Cue>
    where
        I: IntoIterator<Item = Region>,
    {
        regions
            .into_iter()
            .enumerate()
            .fold(Segmentation::default(), |state, (index, region)| {
                state.push(index, region, self.threshold)
            })
            .finish()
    }
}

impl Default for SimilaritySegmenter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

struct OpenCue {
    start: usize,
    end: usize,
    representative: Region,
}

impl OpenCue {
    fn starting_at(index: usize, region: &Region) -> Self {
        Self {
            start: index,
            end: index,
            representative: region.clone(),
        }
    }

    fn close(self) -> Cue {
        Cue::new(self.start, self.end, self.representative)
    }
}

/// Fold accumulator: finalized cues plus the one still accepting frames.
#[derive(Default)]
struct Segmentation {
    closed: Vec<Cue>,
    open: Option<OpenCue>,
    previous: Option<Region>,
}

impl Segmentation {
    fn push(mut self, index: usize, region: Region, threshold: f64) -> Self {
        let merges = match (&self.previous, &self.open) {
            (Some(previous), Some(_)) => {
                let score = mean_squared_error(previous, &region);
                log::trace!("frame {index}: dissimilarity {score:?}");
                score.is_some_and(|s| s < threshold)
            }
            _ => false,
        };

        match self.open.take() {
            Some(mut open) if merges => {
                open.end = index;
                self.open = Some(open);
            }
            Some(open) => {
                self.closed.push(open.close());
                self.open = Some(OpenCue::starting_at(index, &region));
            }
            None => self.open = Some(OpenCue::starting_at(index, &region)),
        }

        self.previous = Some(region);
        self
    }

    fn finish(mut self) -> Vec<Cue> {
        if let Some(open) = self.open.take() {
            self.closed.push(open.close());
        }
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Two-sample grayscale band.
    fn band(values: [u8; 2]) -> Region {
        Region::new(values.to_vec(), 2, 1, 1, 0, 0)
    }

    fn spans(cues: &[Cue]) -> Vec<(usize, usize)> {
        cues.iter().map(|c| (c.start(), c.end())).collect()
    }

    /// Builds bands whose consecutive scores follow a repeating pattern of
    /// "same" (score 0) and "cut" (score 65025).
    fn bands_from_pattern(cuts: &[bool]) -> Vec<Region> {
        let mut value = 0u8;
        let mut bands = vec![band([value, value])];
        for &cut in cuts {
            if cut {
                value = 255 - value;
            }
            bands.push(band([value, value]));
        }
        bands
    }

    #[test]
    fn test_no_regions_no_cues() {
        let segmenter = SimilaritySegmenter::default();
        assert!(segmenter.segment(Vec::new()).is_empty());
    }

    #[test]
    fn test_single_region_single_cue() {
        let cues = SimilaritySegmenter::default().segment(vec![band([1, 2])]);
        assert_eq!(spans(&cues), vec![(0, 0)]);
    }

    #[test]
    fn test_scores_split_into_two_cues() {
        // Consecutive scores: 5, 5, 200, 5
        let regions = vec![
            band([50, 50]),
            band([51, 53]),
            band([52, 56]),
            band([72, 56]),
            band([73, 59]),
        ];
        let cues = SimilaritySegmenter::new(100.0).unwrap().segment(regions);
        assert_eq!(spans(&cues), vec![(0, 2), (3, 4)]);
    }

    #[test]
    fn test_score_equal_to_threshold_does_not_merge() {
        // Uniform offset of 10 on every sample: MSE exactly 100
        let regions = vec![band([0, 0]), band([10, 10])];
        let cues = SimilaritySegmenter::new(100.0).unwrap().segment(regions);
        assert_eq!(spans(&cues), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_score_just_below_threshold_merges() {
        let regions = vec![band([0, 0]), band([10, 10])];
        let cues = SimilaritySegmenter::new(100.001).unwrap().segment(regions);
        assert_eq!(spans(&cues), vec![(0, 1)]);
    }

    #[test]
    fn test_representative_is_first_band_of_cue() {
        let first = band([50, 50]);
        let regions = vec![first.clone(), band([51, 53]), band([52, 56])];
        let cues = SimilaritySegmenter::new(100.0).unwrap().segment(regions);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].representative(), &first);
    }

    #[test]
    fn test_slow_drift_stays_in_one_cue() {
        // Each step differs by 5 from the previous band (score 25), but the
        // last band is far from the first.
        let regions: Vec<_> = (0..20u8).map(|i| band([i * 5, i * 5])).collect();
        let cues = SimilaritySegmenter::new(100.0).unwrap().segment(regions);
        assert_eq!(spans(&cues), vec![(0, 19)]);
    }

    #[test]
    fn test_shape_change_starts_new_cue() {
        let regions = vec![
            band([0, 0]),
            Region::new(vec![0u8; 3], 3, 1, 1, 0, 0),
            Region::new(vec![0u8; 3], 3, 1, 1, 0, 0),
        ];
        let cues = SimilaritySegmenter::default().segment(regions);
        assert_eq!(spans(&cues), vec![(0, 0), (1, 2)]);
    }

    #[rstest]
    #[case::all_same(vec![false, false, false, false])]
    #[case::all_cuts(vec![true, true, true, true])]
    #[case::alternating(vec![true, false, true, false, true])]
    #[case::long_runs(vec![false, false, true, false, false, false, true, false])]
    fn test_cues_partition_sampled_range(#[case] cuts: Vec<bool>) {
        let regions = bands_from_pattern(&cuts);
        let n = regions.len();
        let cues = SimilaritySegmenter::default().segment(regions);

        assert_eq!(cues.len(), 1 + cuts.iter().filter(|&&c| c).count());
        assert_eq!(cues.first().unwrap().start(), 0);
        assert_eq!(cues.last().unwrap().end(), n - 1);
        for pair in cues.windows(2) {
            assert!(pair[0].start() <= pair[0].end());
            assert_eq!(pair[1].start(), pair[0].end() + 1);
        }
    }

    #[test]
    fn test_accepts_lazy_iterator() {
        let cues = SimilaritySegmenter::default().segment((0..3).map(|_| band([9, 9])));
        assert_eq!(spans(&cues), vec![(0, 2)]);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::infinite(f64::INFINITY)]
    #[case::nan(f64::NAN)]
    fn test_invalid_threshold(#[case] threshold: f64) {
        assert!(matches!(
            SimilaritySegmenter::new(threshold),
            Err(SegmentError::InvalidThreshold(_))
        ));
    }
}
