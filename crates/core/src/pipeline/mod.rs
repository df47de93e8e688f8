pub mod extract_subtitles_use_case;
pub mod extraction_config;
pub mod pipeline_logger;
