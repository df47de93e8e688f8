use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("time \"{0}\" does not match format H:M:S or M:S")]
    InvalidTimeFormat(String),
    #[error("frame rate must be a positive number, got {0}")]
    InvalidFrameRate(f64),
    #[error("end frame {end} is before start frame {start}")]
    InvalidWindow { start: usize, end: usize },
}

/// Half-open range `[start, end)` of absolute frame indices to process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: usize,
    pub end: usize,
}

impl TimeWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Parses `H:M:S` or `M:S` into seconds. Components may carry a fraction.
pub fn parse_time(time: &str) -> Result<f64, SamplingError> {
    let invalid = || SamplingError::InvalidTimeFormat(time.to_string());

    let parts: Vec<&str> = time.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid());
    }

    let values = parts
        .iter()
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(invalid)
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [h, m, s] => Ok(h * 3600.0 + m * 60.0 + s),
        [m, s] => Ok(m * 60.0 + s),
        _ => Err(invalid()),
    }
}

/// Converts a time string to a frame index: `floor(seconds * fps)`.
pub fn frame_index(time: &str, fps: f64) -> Result<usize, SamplingError> {
    check_fps(fps)?;
    Ok((parse_time(time)? * fps).floor() as usize)
}

/// Turns optional start/end time strings into a frame window.
///
/// A missing (or blank) start means frame 0, a missing end means the last
/// frame of the video.
pub struct FrameSampler {
    total_frames: usize,
    fps: f64,
}

impl FrameSampler {
    pub fn new(total_frames: usize, fps: f64) -> Result<Self, SamplingError> {
        check_fps(fps)?;
        Ok(Self { total_frames, fps })
    }

    pub fn window(
        &self,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<TimeWindow, SamplingError> {
        let start = match non_blank(start_time) {
            Some(t) => frame_index(t, self.fps)?,
            None => 0,
        };
        let end = match non_blank(end_time) {
            Some(t) => frame_index(t, self.fps)?,
            None => self.total_frames,
        };

        if end < start {
            return Err(SamplingError::InvalidWindow { start, end });
        }
        if end > self.total_frames {
            log::warn!(
                "Requested end frame {end} exceeds the video's {} frames; reading what is available",
                self.total_frames
            );
        }

        Ok(TimeWindow { start, end })
    }
}

fn non_blank(time: Option<&str>) -> Option<&str> {
    time.filter(|t| !t.trim().is_empty())
}

fn check_fps(fps: f64) -> Result<(), SamplingError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(SamplingError::InvalidFrameRate(fps))
    }
}
