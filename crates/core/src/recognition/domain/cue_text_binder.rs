use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::text_recognizer::TextRecognizer;
use crate::segmentation::domain::cue::Cue;

/// What to do when the recognizer fails on a cue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionFailurePolicy {
    /// Log the failure and treat the cue's text as empty, which drops it.
    #[default]
    Skip,
    /// Stop the run with the recognizer's error.
    Abort,
}

#[derive(Error, Debug)]
pub enum BindError {
    #[error("text recognition failed for cue at sampled frame {start}: {message}")]
    Recognition { start: usize, message: String },
    #[error("cancelled")]
    Cancelled,
}

/// A cue with its recognized text. Indices are local to the sampled window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognizedCue {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Strips every whitespace character, including interior spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Runs recognition once per cue and keeps the cues that produced text.
pub struct CueTextBinder<'a> {
    recognizer: &'a dyn TextRecognizer,
    policy: RecognitionFailurePolicy,
}

impl<'a> CueTextBinder<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, policy: RecognitionFailurePolicy) -> Self {
        Self { recognizer, policy }
    }

    /// Recognizes every cue in order, then drops those with empty text.
    ///
    /// `cancelled` is checked before each cue. `on_progress` receives
    /// `(cues_done, cues_total)`.
    pub fn bind(
        &self,
        cues: &[Cue],
        cancelled: &AtomicBool,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<Vec<RecognizedCue>, BindError> {
        let mut recognized = Vec::with_capacity(cues.len());

        for (done, cue) in cues.iter().enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                return Err(BindError::Cancelled);
            }

            let text = match self.recognizer.recognize(cue.representative()) {
                Ok(raw) => normalize_text(&raw),
                Err(e) => match self.policy {
                    RecognitionFailurePolicy::Skip => {
                        log::warn!(
                            "Recognition failed for cue {}-{}, dropping it: {e}",
                            cue.start(),
                            cue.end()
                        );
                        String::new()
                    }
                    RecognitionFailurePolicy::Abort => {
                        return Err(BindError::Recognition {
                            start: cue.start(),
                            message: e.to_string(),
                        })
                    }
                },
            };

            log::debug!(
                "{} --> {} ({} frames): {text}",
                cue.start(),
                cue.end(),
                cue.frame_count()
            );
            recognized.push(RecognizedCue {
                start: cue.start(),
                end: cue.end(),
                text,
            });
            on_progress(done + 1, cues.len());
        }

        Ok(recognized
            .into_iter()
            .filter(|cue| !cue.text.is_empty())
            .collect())
    }
}
