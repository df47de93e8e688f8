use std::fs;
use std::path::Path;

use crate::subtitles::domain::subtitle_entry::{render_srt, SubtitleEntry};
use crate::subtitles::domain::subtitle_writer::SubtitleWriter;

/// Writes entries as a UTF-8 SubRip (`.srt`) file.
pub struct SrtFileWriter;

impl SrtFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SrtFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtitleWriter for SrtFileWriter {
    fn write(
        &self,
        path: &Path,
        entries: &[SubtitleEntry],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, render_srt(entries))?;
        Ok(())
    }
}
