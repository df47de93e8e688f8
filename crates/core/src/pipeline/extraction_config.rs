use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::cue_text_binder::RecognitionFailurePolicy;
use crate::segmentation::domain::region_extractor::{BandError, RegionExtractor};
use crate::segmentation::domain::similarity_segmenter::{SegmentError, SimilaritySegmenter};
use crate::shared::constants::{
    DEFAULT_LANGUAGES, DEFAULT_REGION_BOTTOM, DEFAULT_REGION_TOP, DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::video::domain::frame_sampler::{parse_time, SamplingError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Band(#[from] BandError),
    #[error(transparent)]
    Segment(#[from] SegmentError),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Parameters for one extraction run.
///
/// Every field has a default, so a JSON file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// `H:M:S` or `M:S`; `None` starts at the first frame.
    pub start_time: Option<String>,
    /// `H:M:S` or `M:S`; `None` runs to the last frame.
    pub end_time: Option<String>,
    pub region_top_frac: f64,
    pub region_bottom_frac: f64,
    pub similarity_threshold: f64,
    /// Tesseract language codes, e.g. `["chi_sim", "eng"]`.
    pub languages: Vec<String>,
    pub recognition_failure_policy: RecognitionFailurePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            region_top_frac: DEFAULT_REGION_TOP,
            region_bottom_frac: DEFAULT_REGION_BOTTOM,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            recognition_failure_policy: RecognitionFailurePolicy::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks everything that can be checked without opening the video.
    /// Languages are left to the recognizer that consumes them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for time in [&self.start_time, &self.end_time].into_iter().flatten() {
            if !time.trim().is_empty() {
                parse_time(time)?;
            }
        }
        self.region_extractor()?;
        self.segmenter()?;
        Ok(())
    }

    pub fn region_extractor(&self) -> Result<RegionExtractor, ConfigError> {
        Ok(RegionExtractor::new(
            self.region_top_frac,
            self.region_bottom_frac,
        )?)
    }

    pub fn segmenter(&self) -> Result<SimilaritySegmenter, ConfigError> {
        Ok(SimilaritySegmenter::new(self.similarity_threshold)?)
    }
}

/// Splits a Tesseract-style `chi_sim+eng` list into language codes.
pub fn parse_languages(list: &str) -> Vec<String> {
    list.split('+')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.start_time, None);
        assert_eq!(config.end_time, None);
        assert_eq!(config.region_top_frac, 0.86);
        assert_eq!(config.region_bottom_frac, 0.94);
        assert_eq!(config.similarity_threshold, 100.0);
        assert_eq!(config.languages, vec!["chi_sim", "eng"]);
        assert_eq!(
            config.recognition_failure_policy,
            RecognitionFailurePolicy::Skip
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"start_time": "0:10", "similarity_threshold": 50.0, "recognition_failure_policy": "abort"}"#,
        )
        .unwrap();

        let config = ExtractionConfig::load(&path).unwrap();
        assert_eq!(config.start_time.as_deref(), Some("0:10"));
        assert_eq!(config.similarity_threshold, 50.0);
        assert_eq!(
            config.recognition_failure_policy,
            RecognitionFailurePolicy::Abort
        );
        assert_eq!(config.region_top_frac, 0.86);
        assert_eq!(config.languages, vec!["chi_sim", "eng"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExtractionConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let result = ExtractionConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_serde_round_trip_through_json() {
        let config = ExtractionConfig {
            end_time: Some("1:00".into()),
            languages: vec!["jpn".into()],
            ..ExtractionConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ExtractionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[rstest]
    #[case::bad_start(ExtractionConfig { start_time: Some("1:2:3:4".into()), ..Default::default() })]
    #[case::bad_end(ExtractionConfig { end_time: Some("abc".into()), ..Default::default() })]
    fn test_validate_rejects_time_strings(#[case] config: ExtractionConfig) {
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Sampling(SamplingError::InvalidTimeFormat(_)))
        ));
    }

    #[test]
    fn test_validate_accepts_blank_time_as_missing() {
        let config = ExtractionConfig {
            start_time: Some("  ".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::above_one(0.5, 1.5)]
    #[case::negative(-0.1, 0.5)]
    #[case::inverted(0.9, 0.8)]
    #[case::zero_height(0.5, 0.5)]
    fn test_validate_rejects_band(#[case] top: f64, #[case] bottom: f64) {
        let config = ExtractionConfig {
            region_top_frac: top,
            region_bottom_frac: bottom,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Band(_))));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-5.0)]
    #[case::nan(f64::NAN)]
    fn test_validate_rejects_threshold(#[case] threshold: f64) {
        let config = ExtractionConfig {
            similarity_threshold: threshold,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Segment(_))));
    }

    #[test]
    fn test_validate_leaves_languages_to_recognizer() {
        let config = ExtractionConfig {
            languages: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::pair("chi_sim+eng", vec!["chi_sim", "eng"])]
    #[case::single("eng", vec!["eng"])]
    #[case::stray_separators("+eng++jpn+", vec!["eng", "jpn"])]
    #[case::empty("", vec![])]
    fn test_parse_languages(#[case] list: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_languages(list), expected);
    }
}
