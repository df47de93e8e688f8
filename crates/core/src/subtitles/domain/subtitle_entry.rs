use std::fmt;

use super::timestamp::SubtitleTimestamp;
use crate::recognition::domain::cue_text_binder::RecognizedCue;

/// One timed subtitle line with absolute video times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub start: SubtitleTimestamp,
    pub end: SubtitleTimestamp,
    pub text: String,
}

impl SubtitleEntry {
    /// Converts a window-local cue to absolute times. `window_start` is the
    /// absolute index of the window's first frame.
    pub fn from_cue(cue: &RecognizedCue, window_start: usize, fps: f64) -> Self {
        Self {
            start: SubtitleTimestamp::from_frame(window_start + cue.start, fps),
            end: SubtitleTimestamp::from_frame(window_start + cue.end, fps),
            text: cue.text.clone(),
        }
    }
}

impl fmt::Display for SubtitleEntry {
    /// `HH:MM:SS,mmm --> HH:MM:SS,mmm\ntext\n`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} --> {}", self.start, self.end)?;
        writeln!(f, "{}", self.text)
    }
}

pub fn build_entries(cues: &[RecognizedCue], window_start: usize, fps: f64) -> Vec<SubtitleEntry> {
    cues.iter()
        .map(|cue| SubtitleEntry::from_cue(cue, window_start, fps))
        .collect()
}

/// Entries as plain timed blocks, each followed by a blank line.
pub fn render_listing(entries: &[SubtitleEntry]) -> String {
    entries.iter().map(|e| format!("{e}\n")).collect()
}

/// Entries as a SubRip document with 1-based sequence numbers.
pub fn render_srt(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{}\n{e}\n", i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: usize, end: usize, text: &str) -> RecognizedCue {
        RecognizedCue {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_from_cue_offsets_by_window_start() {
        let entry = SubtitleEntry::from_cue(&cue(0, 25, "你好"), 125, 25.0);
        assert_eq!(entry.start.to_string(), "00:00:05,000");
        assert_eq!(entry.end.to_string(), "00:00:06,000");
        assert_eq!(entry.text, "你好");
    }

    #[test]
    fn test_display_entry() {
        let entry = SubtitleEntry::from_cue(&cue(0, 50, "字幕"), 0, 25.0);
        assert_eq!(entry.to_string(), "00:00:00,000 --> 00:00:02,000\n字幕\n");
    }

    #[test]
    fn test_listing_separates_entries_with_blank_line() {
        let entries = build_entries(&[cue(0, 24, "一"), cue(25, 49, "二")], 0, 25.0);
        assert_eq!(
            render_listing(&entries),
            "00:00:00,000 --> 00:00:00,960\n一\n\n\
             00:00:01,000 --> 00:00:01,960\n二\n\n"
        );
    }

    #[test]
    fn test_srt_numbers_entries_from_one() {
        let entries = build_entries(&[cue(0, 24, "一"), cue(25, 49, "二")], 0, 25.0);
        assert_eq!(
            render_srt(&entries),
            "1\n00:00:00,000 --> 00:00:00,960\n一\n\n\
             2\n00:00:01,000 --> 00:00:01,960\n二\n\n"
        );
    }

    #[test]
    fn test_no_cues_render_nothing() {
        let entries = build_entries(&[], 100, 25.0);
        assert!(entries.is_empty());
        assert_eq!(render_listing(&entries), "");
        assert_eq!(render_srt(&entries), "");
    }

    #[test]
    fn test_entries_keep_cue_order() {
        let entries = build_entries(&[cue(3, 4, "b"), cue(10, 12, "c")], 0, 10.0);
        assert!(entries.windows(2).all(|w| w[0].start < w[1].start));
    }
}
