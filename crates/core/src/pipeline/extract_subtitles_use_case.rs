use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use thiserror::Error;

use crate::pipeline::extraction_config::{ConfigError, ExtractionConfig};
use crate::pipeline::pipeline_logger::{PipelineLogger, PipelineStage};
use crate::recognition::domain::cue_text_binder::{BindError, CueTextBinder};
use crate::recognition::domain::text_recognizer::TextRecognizer;
use crate::segmentation::domain::cue::Cue;
use crate::segmentation::domain::region_extractor::RegionExtractor;
use crate::segmentation::domain::similarity_segmenter::SimilaritySegmenter;
use crate::shared::region::Region;
use crate::shared::video_metadata::VideoMetadata;
use crate::subtitles::domain::subtitle_entry::{build_entries, SubtitleEntry};
use crate::video::domain::frame_sampler::{FrameSampler, TimeWindow};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Receives `(frames_read, frames_in_window)`; returning `false` cancels.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to seek video to frame {frame}: {message}")]
    Seek { frame: usize, message: String },
    #[error("no frame could be decoded: {message}")]
    Decode { message: String },
    #[error("frame reader thread panicked")]
    ReaderPanicked,
    #[error(transparent)]
    Recognition(BindError),
    #[error("cancelled")]
    Cancelled,
    #[error("pipeline already executed")]
    AlreadyExecuted,
}

impl From<BindError> for ExtractionError {
    fn from(e: BindError) -> Self {
        match e {
            BindError::Cancelled => ExtractionError::Cancelled,
            other => ExtractionError::Recognition(other),
        }
    }
}

/// Orchestrates subtitle extraction from an opened video.
///
/// A reader thread seeks to the requested window, decodes and crops each
/// frame to the subtitle band, and streams the bands to the main thread,
/// which folds them into cues. Cues are then recognized, filtered and
/// converted to absolute timestamps.
///
/// This is a single-use struct: `execute` takes the owned reader, so
/// calling it twice fails with `AlreadyExecuted`.
pub struct ExtractSubtitlesUseCase {
    reader: Option<Box<dyn VideoReader>>,
    recognizer: Box<dyn TextRecognizer>,
    config: ExtractionConfig,
    logger: Box<dyn PipelineLogger>,
    keyframes: Option<(Box<dyn ImageWriter>, PathBuf)>,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
}

impl ExtractSubtitlesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        recognizer: Box<dyn TextRecognizer>,
        config: ExtractionConfig,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<ProgressCallback>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            recognizer,
            config,
            logger,
            keyframes: None,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Saves each cue's representative band to `dir/cue_<frame>.png`.
    pub fn with_keyframe_dump(mut self, writer: Box<dyn ImageWriter>, dir: PathBuf) -> Self {
        self.keyframes = Some((writer, dir));
        self
    }

    /// Runs the pipeline against the video `metadata` describes. The reader
    /// must already be open on that video.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
    ) -> Result<Vec<SubtitleEntry>, ExtractionError> {
        let mut reader = self
            .reader
            .take()
            .ok_or(ExtractionError::AlreadyExecuted)?;

        let (window, extractor, segmenter) = match self.prepare(metadata) {
            Ok(prepared) => prepared,
            Err(e) => {
                reader.close();
                return Err(e);
            }
        };

        if window.is_empty() {
            reader.close();
            self.logger.info("Sampled window is empty, nothing to extract");
            return Ok(Vec::new());
        }

        if let Err(e) = reader.seek(window.start) {
            reader.close();
            return Err(ExtractionError::Seek {
                frame: window.start,
                message: e.to_string(),
            });
        }

        let segment_start = Instant::now();
        let (cues, frames_read) = match self.segment(reader, extractor, &segmenter, window) {
            Ok(segmented) => segmented,
            Err(e) => {
                self.logger.summary();
                return Err(e);
            }
        };
        self.logger
            .timing("segment", segment_start.elapsed().as_secs_f64() * 1000.0);
        self.logger.metric("frames", frames_read as f64);
        self.logger.metric("cues", cues.len() as f64);

        if frames_read < window.len() {
            log::warn!(
                "Read {frames_read} of {} requested frames; continuing with what was decoded",
                window.len()
            );
        }

        if cues.is_empty() {
            self.logger.info("No frames were sampled, skipping recognition");
            self.logger.summary();
            return Ok(Vec::new());
        }

        self.dump_keyframes(&cues, window.start);

        let recognize_start = Instant::now();
        let binder = CueTextBinder::new(&*self.recognizer, self.config.recognition_failure_policy);
        let logger = &mut self.logger;
        let bound = binder.bind(&cues, &self.cancelled, |done, total| {
            logger.progress(PipelineStage::Recognize, done, total)
        });
        self.logger
            .timing("recognize", recognize_start.elapsed().as_secs_f64() * 1000.0);
        let recognized = match bound {
            Ok(recognized) => recognized,
            Err(e) => {
                self.logger.summary();
                return Err(e.into());
            }
        };

        let entries = build_entries(&recognized, window.start, metadata.fps);
        self.logger.metric("subtitles", entries.len() as f64);
        self.logger.info(&format!(
            "Extracted {} subtitles from {} cues",
            entries.len(),
            cues.len()
        ));
        self.logger.summary();

        Ok(entries)
    }

    fn prepare(
        &mut self,
        metadata: &VideoMetadata,
    ) -> Result<(TimeWindow, RegionExtractor, SimilaritySegmenter), ExtractionError> {
        self.config.validate()?;
        let extractor = self.config.region_extractor()?;
        let segmenter = self.config.segmenter()?;
        let rows = extractor
            .rows(metadata.height)
            .map_err(ConfigError::from)?;
        let window = FrameSampler::new(metadata.total_frames, metadata.fps)
            .and_then(|sampler| {
                sampler.window(
                    self.config.start_time.as_deref(),
                    self.config.end_time.as_deref(),
                )
            })
            .map_err(ConfigError::from)?;

        self.logger.info(&format!(
            "Sampling frames {}..{} at {:.3} fps, band rows {}..{}",
            window.start, window.end, metadata.fps, rows.start, rows.end
        ));
        Ok((window, extractor, segmenter))
    }

    /// Streams bands from a reader thread through the segmenter. Returns the
    /// cues and the number of frames that reached the fold. A reader error
    /// before the first frame is fatal; a later one ends the stream early.
    fn segment(
        &mut self,
        reader: Box<dyn VideoReader>,
        extractor: RegionExtractor,
        segmenter: &SimilaritySegmenter,
        window: TimeWindow,
    ) -> Result<(Vec<Cue>, usize), ExtractionError> {
        let total = window.len();
        let (region_tx, region_rx) =
            crossbeam_channel::bounded::<Result<Region, SendError>>(DEFAULT_CHANNEL_CAPACITY);
        let reader_handle = spawn_reader(
            reader,
            extractor,
            total,
            region_tx,
            self.cancelled.clone(),
        );

        let mut frames_read = 0;
        let mut decode_error = None;
        let cancelled = &self.cancelled;
        let logger = &mut self.logger;
        let on_progress = &self.on_progress;

        let regions = region_rx
            .iter()
            .map_while(|result| match result {
                Ok(region) => Some(region),
                Err(e) => {
                    decode_error = Some(e.to_string());
                    None
                }
            })
            .inspect(|_| {
                frames_read += 1;
                logger.progress(PipelineStage::Segment, frames_read, total);
                if let Some(callback) = on_progress {
                    if !callback(frames_read, total) {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                }
            });
        let cues = segmenter.segment(regions);
        drop(region_rx);

        reader_handle
            .join()
            .map_err(|_| ExtractionError::ReaderPanicked)?;

        if self.cancelled.load(Ordering::Relaxed) {
            return Err(ExtractionError::Cancelled);
        }
        if let Some(message) = decode_error {
            if frames_read == 0 {
                return Err(ExtractionError::Decode { message });
            }
            log::warn!("Frame decoding stopped after {frames_read} frames: {message}");
        }
        Ok((cues, frames_read))
    }

    fn dump_keyframes(&self, cues: &[Cue], window_start: usize) {
        let Some((writer, dir)) = &self.keyframes else {
            return;
        };
        for cue in cues {
            let path = dir.join(format!("cue_{:06}.png", window_start + cue.start()));
            if let Err(e) = writer.write(&path, cue.representative()) {
                log::warn!("Failed to save keyframe {}: {e}", path.display());
            }
        }
    }
}

/// Decodes up to `limit` frames, crops each to the band and sends it on.
/// Stops at the first decode or crop error after forwarding it. The reader
/// is closed before the thread exits.
fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    extractor: RegionExtractor,
    limit: usize,
    region_tx: crossbeam_channel::Sender<Result<Region, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for frame_result in reader.frames().take(limit) {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let region = match frame_result {
                Ok(frame) => extractor
                    .extract(&frame)
                    .map_err(|e| -> SendError { e.into() }),
                Err(e) => Err(e.to_string().into()),
            };
            let failed = region.is_err();
            if region_tx.send(region).is_err() || failed {
                break;
            }
        }
        reader.close();
    })
}
