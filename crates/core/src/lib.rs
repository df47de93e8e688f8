pub mod pipeline;
pub mod recognition;
pub mod segmentation;
pub mod shared;
pub mod subtitles;
pub mod video;
