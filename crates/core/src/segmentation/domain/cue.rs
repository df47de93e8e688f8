use crate::shared::region::Region;

/// A run of consecutive sampled frames showing the same subtitle.
///
/// `start` and `end` are inclusive and local to the sampled window: index 0
/// is the first sampled frame. The representative region is the run's first
/// band, which is what gets recognized.
#[derive(Clone, Debug, PartialEq)]
pub struct Cue {
    start: usize,
    end: usize,
    representative: Region,
}

impl Cue {
    pub fn new(start: usize, end: usize, representative: Region) -> Self {
        debug_assert!(start <= end, "cue start must not exceed end");
        Self {
            start,
            end,
            representative,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn representative(&self) -> &Region {
        &self.representative
    }

    /// Number of sampled frames the cue covers.
    pub fn frame_count(&self) -> usize {
        self.end - self.start + 1
    }
}
