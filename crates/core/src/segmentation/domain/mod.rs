pub mod cue;
pub mod dissimilarity;
pub mod region_extractor;
pub mod similarity_segmenter;
