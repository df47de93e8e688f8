use std::fmt;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// A subtitle display time with millisecond resolution.
///
/// Formats as `HH:MM:SS,mmm`. Hours grow past two digits instead of
/// wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubtitleTimestamp {
    millis: u64,
}

impl SubtitleTimestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Time at which `frame_index` is shown. The frame time is taken to
    /// microsecond precision, then truncated to whole milliseconds.
    ///
    /// `fps` must be positive.
    pub fn from_frame(frame_index: usize, fps: f64) -> Self {
        let micros = (frame_index as f64 / fps * MICROS_PER_SECOND).round() as u64;
        Self {
            millis: micros / 1000,
        }
    }
}

impl fmt::Display for SubtitleTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.millis % 1000;
        let total_secs = self.millis / 1000;
        let (m, s) = (total_secs / 60, total_secs % 60);
        let (h, m) = (m / 60, m % 60);
        write!(f, "{h:02}:{m:02}:{s:02},{ms:03}")
    }
}

/// Formats the display time of a frame as `HH:MM:SS,mmm`.
pub fn format_timestamp(frame_index: usize, fps: f64) -> String {
    SubtitleTimestamp::from_frame(frame_index, fps).to_string()
}
