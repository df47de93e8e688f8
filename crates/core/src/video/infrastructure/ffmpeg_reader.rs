use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`].
/// Seeking jumps to the nearest preceding keyframe, then decodes forward and
/// discards frames until the requested index is reached.
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
    metadata: Option<VideoMetadata>,
    seek_target: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video_stream_index: 0,
            metadata: None,
            seek_target: 0,
        }
    }

    fn frame_iter(&mut self) -> Result<FfmpegFrameIter<'_>, Box<dyn std::error::Error>> {
        let fps = self.metadata.as_ref().map(|m| m.fps).unwrap_or(0.0);
        let ictx = self.input_ctx.as_mut().ok_or("FfmpegReader: not opened")?;

        let stream = ictx
            .stream(self.video_stream_index)
            .ok_or("Video stream disappeared")?;
        let time_base = f64::from(stream.time_base());
        let start_ts = match stream.start_time() {
            ts if ts == ffmpeg_next::ffi::AV_NOPTS_VALUE => 0,
            ts => ts,
        };
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let next_index = (self.seek_target == 0).then_some(0);

        Ok(FfmpegFrameIter {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index: self.video_stream_index,
            clock: FrameClock {
                time_base,
                start_ts,
                fps,
            },
            target: self.seek_target,
            next_index,
            flushing: false,
            done: false,
        })
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        // Some containers don't record a frame count; estimate from duration.
        let total_frames = match stream.frames() {
            n if n > 0 => n as usize,
            _ if ictx.duration() > 0 => {
                (ictx.duration() as f64 / MICROS_PER_SECOND * fps).floor() as usize
            }
            _ => 0,
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.video_stream_index = video_stream_index;
        self.metadata = Some(metadata.clone());
        self.input_ctx = Some(ictx);
        self.seek_target = 0;

        Ok(metadata)
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), Box<dyn std::error::Error>> {
        let fps = self.metadata.as_ref().map(|m| m.fps).unwrap_or(0.0);
        let ictx = self.input_ctx.as_mut().ok_or("FfmpegReader: not opened")?;

        if frame_index > 0 {
            if fps <= 0.0 {
                return Err("Cannot seek in a video with unknown frame rate".into());
            }
            let ts = (frame_index as f64 / fps * MICROS_PER_SECOND) as i64;
            ictx.seek(ts, ..ts)?;
        } else {
            ictx.seek(0, ..0)?;
        }

        self.seek_target = frame_index;
        Ok(())
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.frame_iter() {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
        self.metadata = None;
        self.seek_target = 0;
    }
}

/// Maps stream timestamps to frame indices.
struct FrameClock {
    time_base: f64,
    start_ts: i64,
    fps: f64,
}

impl FrameClock {
    fn index_of(&self, ts: i64) -> usize {
        let seconds = (ts - self.start_ts) as f64 * self.time_base;
        (seconds * self.fps).round().max(0.0) as usize
    }
}

/// Lazy iterator that decodes video frames one at a time, avoiding the need
/// to buffer the entire video in memory.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    clock: FrameClock,
    target: usize,
    /// Index of the next decoded frame once the seek target has been reached.
    next_index: Option<usize>,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    /// Resolves the index of a freshly decoded frame, or `None` if the frame
    /// lies before the seek target and must be dropped.
    fn assign_index(&mut self, decoded: &ffmpeg_next::util::frame::video::Video) -> Option<usize> {
        let index = match self.next_index {
            Some(i) => i,
            None => match decoded.timestamp() {
                Some(ts) => {
                    let i = self.clock.index_of(ts);
                    if i < self.target {
                        return None;
                    }
                    i
                }
                None => {
                    log::debug!("Decoded frame has no timestamp; assuming seek target");
                    self.target
                }
            },
        };
        self.next_index = Some(index + 1);
        Some(index)
    }

    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let Some(index) = self.assign_index(&decoded) else {
                continue;
            };

            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
                return Some(Err(Box::new(e)));
            }

            let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
            return Some(Ok(Frame::new(pixels, self.width, self.height, 3, index)));
        }
        None
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;

    let mut pixels = Vec::with_capacity(w * height as usize * 3);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
