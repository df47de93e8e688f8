use std::path::Path;

use super::subtitle_entry::SubtitleEntry;

/// Persists a finished subtitle track.
pub trait SubtitleWriter: Send {
    fn write(&self, path: &Path, entries: &[SubtitleEntry])
        -> Result<(), Box<dyn std::error::Error>>;
}
